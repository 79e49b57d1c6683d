//! Static per-entity admin configuration and the registry built at startup.
//!
//! Each entity the console manages is described by one `ModelAdmin` value.
//! Handlers read everything they render (columns, fieldsets, search and
//! filter fields, inline children) from it rather than inspecting the schema.

use crate::constants::MAX_TEXT_LENGTH;

/// Entities the console knows how to manage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Question,
}

/// An editable or displayable field of an entity.
#[derive(Copy, Clone, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Maximum length in characters, for text inputs.
    pub max_length: Option<usize>,
}

/// A titled group of fields on the change form.
#[derive(Copy, Clone, Debug)]
pub struct Fieldset {
    pub title: Option<&'static str>,
    pub classes: &'static [&'static str],
    pub fields: &'static [&'static str],
}

/// A column of the change list.
#[derive(Copy, Clone, Debug)]
pub struct ListColumn {
    pub field: &'static str,
    pub label: &'static str,
    /// Rendered as a yes/no marker instead of text.
    pub boolean: bool,
    /// Field the column sorts by, if sortable.
    pub order_field: Option<&'static str>,
}

/// Child records edited on the parent's change form.
#[derive(Copy, Clone, Debug)]
pub struct InlineAdmin {
    pub verbose_name_plural: &'static str,
    /// Form field prefix, e.g. `choice_set-0-choice_text`.
    pub prefix: &'static str,
    pub fields: &'static [FieldSpec],
    /// Number of blank rows offered for new children.
    pub extra: usize,
}

#[derive(Copy, Clone, Debug)]
pub struct ModelAdmin {
    pub kind: ModelKind,
    /// URL segment under /admin/.
    pub slug: &'static str,
    pub verbose_name: &'static str,
    pub verbose_name_plural: &'static str,
    pub fields: &'static [FieldSpec],
    pub fieldsets: &'static [Fieldset],
    pub list_display: &'static [ListColumn],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub readonly_fields: &'static [&'static str],
    pub inlines: &'static [InlineAdmin],
    /// Default change list ordering, `-` prefix for descending.
    pub ordering: &'static str,
}

impl ModelAdmin {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_readonly(&self, name: &str) -> bool {
        self.readonly_fields.contains(&name)
    }

    pub fn has_list_filter(&self, name: &str) -> bool {
        self.list_filter.contains(&name)
    }

    /// Fields the change list may be sorted by.
    pub fn sortable_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.list_display.iter().filter_map(|c| c.order_field)
    }

    pub fn changelist_url(&self) -> String {
        format!("/admin/{}/", self.slug)
    }

    pub fn add_url(&self) -> String {
        format!("/admin/{}/add/", self.slug)
    }

    pub fn change_url(&self, id: i32) -> String {
        format!("/admin/{}/{}/change/", self.slug, id)
    }

    pub fn delete_url(&self, id: i32) -> String {
        format!("/admin/{}/{}/delete/", self.slug, id)
    }
}

pub const CHOICE_INLINE: InlineAdmin = InlineAdmin {
    verbose_name_plural: "Choices",
    prefix: "choice_set",
    fields: &[
        FieldSpec {
            name: "choice_text",
            label: "Choice text",
            max_length: Some(MAX_TEXT_LENGTH),
        },
        FieldSpec {
            name: "votes",
            label: "Votes",
            max_length: None,
        },
    ],
    extra: 1,
};

pub const QUESTION_ADMIN: ModelAdmin = ModelAdmin {
    kind: ModelKind::Question,
    slug: "questions",
    verbose_name: "question",
    verbose_name_plural: "questions",
    fields: &[
        FieldSpec {
            name: "question_text",
            label: "Question text",
            max_length: Some(MAX_TEXT_LENGTH),
        },
        FieldSpec {
            name: "created",
            label: "Date created",
            max_length: None,
        },
    ],
    fieldsets: &[
        Fieldset {
            title: None,
            classes: &[],
            fields: &["question_text"],
        },
        Fieldset {
            title: Some("Date information"),
            classes: &["collapse"],
            fields: &["created"],
        },
    ],
    list_display: &[
        ListColumn {
            field: "question_text",
            label: "Question text",
            boolean: false,
            order_field: Some("question_text"),
        },
        ListColumn {
            field: "created",
            label: "Date created",
            boolean: false,
            order_field: Some("created"),
        },
        ListColumn {
            field: "was_created_recently",
            label: "Published recently?",
            boolean: true,
            order_field: Some("created"),
        },
    ],
    list_filter: &["created"],
    search_fields: &["question_text"],
    readonly_fields: &["created"],
    inlines: &[CHOICE_INLINE],
    ordering: "-created",
};

/// Registered entities, in registration order.
///
/// Built once while the process starts and shared with handlers as
/// application data.
#[derive(Clone, Debug, Default)]
pub struct AdminSite {
    models: Vec<ModelAdmin>,
}

impl AdminSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// The console as shipped: questions with inline choices.
    pub fn default_site() -> Self {
        Self::new().register(QUESTION_ADMIN)
    }

    /// Register `admin`, replacing an earlier registration of the same kind.
    pub fn register(mut self, admin: ModelAdmin) -> Self {
        if let Some(existing) = self.models.iter_mut().find(|m| m.kind == admin.kind) {
            log::warn!("{:?} registered twice with the admin site", admin.kind);
            *existing = admin;
        } else {
            self.models.push(admin);
        }
        self
    }

    pub fn get(&self, kind: ModelKind) -> Option<&ModelAdmin> {
        self.models.iter().find(|m| m.kind == kind)
    }

    pub fn models(&self) -> &[ModelAdmin] {
        &self.models
    }
}
