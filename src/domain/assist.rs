//! Seams for the AI-assisted features.
//!
//! The services themselves live outside this crate. The core only shapes the
//! requests and folds the answers back in: suggested names are resolved to
//! ids, and drafts feed an ordinary create.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{
    definition::{Content, Definition, DefinitionId},
    store::DefinitionStore,
};

/// What the suggestion service is told about a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// The definition's name.
    pub name: String,
    /// The definition's description.
    pub description: String,
    /// The definition's keywords.
    pub keywords: Vec<String>,
}

impl From<&Definition> for SuggestionRequest {
    fn from(definition: &Definition) -> Self {
        Self {
            name: definition.content.name.clone(),
            description: definition.content.description.clone(),
            keywords: definition.content.keywords.clone(),
        }
    }
}

/// Proposes names of definitions related to the one described.
pub trait SuggestionSource {
    /// The error the service can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns suggested definition names, not ids.
    ///
    /// # Errors
    ///
    /// Whatever the service reports.
    fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<String>, Self::Error>;
}

/// A definition drafted from free-form source text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Proposed name.
    pub name: String,
    /// Proposed description.
    pub description: String,
    /// Proposed keywords.
    pub keywords: Vec<String>,
}

impl From<Draft> for Content {
    fn from(draft: Draft) -> Self {
        Self {
            name: draft.name,
            description: draft.description,
            keywords: draft.keywords,
            ..Self::default()
        }
    }
}

/// Drafts a definition from source text.
pub trait DraftSource {
    /// The error the service can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Produces a draft.
    ///
    /// # Errors
    ///
    /// Whatever the service reports.
    fn draft(&self, source: &str) -> Result<Draft, Self::Error>;
}

/// Resolves suggested names to ids for the definition `target`.
///
/// Names that match no definition, that match `target` itself, or that match
/// a definition already related to `target` are dropped, as are repeats.
#[must_use]
pub fn resolve_suggestions(
    store: &DefinitionStore,
    target: &Definition,
    names: &[String],
) -> Vec<DefinitionId> {
    let mut seen: HashSet<&DefinitionId> = target.content.related_definitions.iter().collect();
    seen.insert(&target.id);

    let mut resolved = Vec::new();
    for name in names {
        let Some(found) = store.iter().find(|node| node.content.name == name.trim()) else {
            tracing::debug!("dropping unresolved suggestion '{name}'");
            continue;
        };
        if seen.insert(&found.id) {
            resolved.push(found.id.clone());
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hierarchy::tests::sample;

    #[test]
    fn resolves_names_and_drops_the_rest() {
        let mut store = DefinitionStore::new(sample()).unwrap();
        store.relate(&"1.1".into(), &"1.2".into()).unwrap();
        let target = store.find(&"1.1".into()).unwrap().clone();

        let names = [
            "Contracted Rates",
            "Auth Decision Date",
            "Auth Status",
            "No Such Thing",
            "Contracted Rates",
            " Provider ",
        ]
        .map(String::from);

        let ids = resolve_suggestions(&store, &target, &names);

        assert_eq!(ids, vec!["2.1.1".into(), "2".into()]);
    }

    #[test]
    fn draft_becomes_content() {
        let content = Content::from(Draft {
            name: "Member Id".to_string(),
            description: "<p>Identifies a member</p>".to_string(),
            keywords: vec!["member".to_string()],
        });

        assert_eq!(content.name, "Member Id");
        assert!(content.module.is_empty());
        assert_eq!(content.keywords, ["member"]);
    }

    #[test]
    fn request_mirrors_definition() {
        let store = DefinitionStore::new(sample()).unwrap();
        let request = SuggestionRequest::from(store.find(&"1.1".into()).unwrap().as_ref());
        assert_eq!(request.name, "Auth Decision Date");
    }
}
