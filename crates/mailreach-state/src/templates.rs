//! Template slice

use crate::query::ListQuery;
use crate::slice::ListSlice;
use crate::store::Store;
use mailreach_client::models::{validate_payload, Template, TemplatePayload};
use mailreach_client::NoFilter;
use mailreach_common::types::TemplateId;
use mailreach_common::Result;

#[derive(Debug, Clone)]
pub struct TemplatesState {
    pub templates: ListSlice<Template, NoFilter>,
}

impl TemplatesState {
    pub fn new(page_size: u32) -> Self {
        Self {
            templates: ListSlice::new(page_size),
        }
    }

    /// Template names by category, for the compose picker
    pub fn in_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Template> {
        self.templates
            .items
            .items()
            .iter()
            .filter(move |t| t.category.as_deref() == Some(category))
    }
}

impl Store {
    pub async fn fetch_templates(&self) -> Result<()> {
        let service = &self.services().templates;
        self.fetch_list(
            |s| &mut s.templates.templates,
            |_, params| async move { service.list(&params).await },
        )
        .await
    }

    pub async fn update_template_query(
        &self,
        change: impl FnOnce(&mut ListQuery<NoFilter>) -> bool,
    ) -> Result<bool> {
        if !self.change_query(|s| &mut s.templates.templates, change).await {
            return Ok(false);
        }
        self.fetch_templates().await?;
        Ok(true)
    }

    pub async fn create_template(&self, input: &TemplatePayload) -> Result<Template> {
        validate_payload(input)?;
        self.create_in(
            |s| &mut s.templates.templates,
            self.services().templates.create(input),
        )
        .await
    }

    pub async fn update_template(
        &self,
        id: TemplateId,
        input: &TemplatePayload,
    ) -> Result<Option<Template>> {
        validate_payload(input)?;
        self.merge_in(
            |s| &mut s.templates.templates,
            id,
            self.services().templates.update(id, input),
        )
        .await
    }

    pub async fn delete_template(&self, id: TemplateId) -> Result<()> {
        self.remove_in(
            |s| &mut s.templates.templates,
            id,
            self.services().templates.delete(id),
        )
        .await
    }
}
