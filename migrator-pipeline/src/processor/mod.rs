//! Transformation of a source record into destination values.
use std::sync::Arc;

use migrator_shared::types::{FieldType, ModelMapping, NotFoundPolicy, Record};
use tracing::{debug, warn};

use crate::errors::RecordError;
use crate::resolver::{RelationResolver, Resolution};

/// Result of processing one source record.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// Destination values ready to be committed. May be empty.
    Ready(Record),
    /// A relation on `field` could not be resolved under the `skip` policy;
    /// the record is dropped from this run.
    Skipped { field: String },
}

/// Builds destination values field mapping by field mapping.
///
/// Scalars are copied unchanged, relations go through the
/// [`RelationResolver`].
pub struct RecordProcessor {
    resolver: Arc<RelationResolver>,
}

impl RecordProcessor {
    pub fn new(resolver: Arc<RelationResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &RelationResolver {
        &self.resolver
    }

    pub async fn process(&self, mapping: &ModelMapping, record: &Record) -> Result<Processed, RecordError> {
        let mut values = Record::new();

        for field in &mapping.field_mappings {
            let (Some(source_field), Some(destination_field)) = (&field.source_field, &field.destination_field) else {
                continue;
            };
            let Some(value) = record.get(source_field) else {
                continue;
            };

            if !field.is_relational() {
                if field.field_type.as_ref().is_some_and(FieldType::is_relational) {
                    warn!(
                        model = %mapping.source_model,
                        field = %source_field,
                        "relational field without related model ignored"
                    );
                    continue;
                }
                values.insert(destination_field.clone(), value.clone());
                continue;
            }

            match self
                .resolver
                .resolve(field, value)
                .await
                .map_err(|e| RecordError::resolve(source_field, e))?
            {
                Resolution::Absent => {}
                Resolution::Resolved(resolved) => values.insert(destination_field.clone(), resolved),
                Resolution::Unresolved if field.not_found == NotFoundPolicy::Skip => {
                    debug!(
                        model = %mapping.source_model,
                        source_id = ?record.id(),
                        field = %source_field,
                        "unresolved relation, record skipped"
                    );
                    return Ok(Processed::Skipped {
                        field: source_field.clone(),
                    });
                }
                Resolution::Unresolved => {
                    debug!(field = %source_field, "unresolved relation left empty");
                }
            }
        }

        Ok(Processed::Ready(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_repository::InMemoryIdMappingRepository;
    use migrator_shared::types::{DuplicatePolicy, FieldMapping, FieldValue};
    use object_rpc::MockObjectStore;

    fn processor(source: MockObjectStore, destination: MockObjectStore) -> RecordProcessor {
        let resolver = RelationResolver::new(
            1,
            Arc::new(source),
            Arc::new(destination),
            Arc::new(InMemoryIdMappingRepository::new()),
        );
        RecordProcessor::new(Arc::new(resolver))
    }

    fn partner_mapping(not_found: NotFoundPolicy) -> ModelMapping {
        ModelMapping {
            id: 1,
            source_model: "res.partner".to_string(),
            destination_model: "partner.core".to_string(),
            field_mappings: vec![
                FieldMapping::scalar(1, "name", "full_name"),
                FieldMapping::relation(2, "country_id", "nation", FieldType::Many2one, "res.country", &["code"])
                    .with_policies(not_found, DuplicatePolicy::First),
            ],
        }
    }

    fn source() -> MockObjectStore {
        MockObjectStore::new().with_record("res.country", Record::new().with("id", 10).with("code", "FR"))
    }

    #[tokio::test]
    async fn test_scalars_pass_through_and_relations_resolve() {
        let destination = MockObjectStore::new().with_record("res.country", Record::new().with("id", 70).with("code", "FR"));
        let processor = processor(source(), destination);
        let record = Record::new()
            .with("id", 5)
            .with("name", "Acme")
            .with("country_id", FieldValue::LabeledIdRef(10, "France".into()));

        let processed = processor.process(&partner_mapping(NotFoundPolicy::Skip), &record).await.unwrap();

        assert_eq!(
            processed,
            Processed::Ready(Record::new().with("full_name", "Acme").with("nation", FieldValue::IdRef(70)))
        );
    }

    #[tokio::test]
    async fn test_unresolved_with_skip_policy_drops_record() {
        let processor = processor(source(), MockObjectStore::new());
        let record = Record::new().with("id", 5).with("name", "Acme").with("country_id", 10);

        let processed = processor.process(&partner_mapping(NotFoundPolicy::Skip), &record).await.unwrap();

        assert_eq!(
            processed,
            Processed::Skipped {
                field: "country_id".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_relation_keeps_record() {
        let processor = processor(source(), MockObjectStore::new());
        let record = Record::new().with("id", 5).with("name", "Acme").with("country_id", false);

        let processed = processor.process(&partner_mapping(NotFoundPolicy::Skip), &record).await.unwrap();

        assert_eq!(processed, Processed::Ready(Record::new().with("full_name", "Acme")));
    }

    #[tokio::test]
    async fn test_incomplete_and_modelless_mappings_are_ignored() {
        let processor = processor(source(), MockObjectStore::new());
        let mut modelless = FieldMapping::scalar(3, "parent_id", "parent_id");
        modelless.field_type = Some(FieldType::Many2one);
        let mut incomplete = FieldMapping::scalar(4, "email", "email");
        incomplete.destination_field = None;

        let mapping = ModelMapping {
            id: 1,
            source_model: "res.partner".to_string(),
            destination_model: "partner.core".to_string(),
            field_mappings: vec![FieldMapping::scalar(1, "name", "full_name"), modelless, incomplete],
        };
        let record = Record::new()
            .with("id", 5)
            .with("name", "Acme")
            .with("parent_id", 3)
            .with("email", "a@x");

        let processed = processor.process(&mapping, &record).await.unwrap();
        assert_eq!(processed, Processed::Ready(Record::new().with("full_name", "Acme")));
    }
}
