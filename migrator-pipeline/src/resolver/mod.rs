//! Resolution of relational field values across stores.
//!
//! A relational source value names records of the source store. The
//! resolver turns each source id into the id of the corresponding
//! destination record, consulting the id mapping first and otherwise
//! matching on the field mapping's search fields, then remembers the result
//! so later references to the same record are answered from the mapping.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use migrator_repository::{IdMappingRepository, RepositoryError};
use migrator_shared::types::{
    ConfigId, Domain, DuplicatePolicy, FieldMapping, FieldValue, ID_FIELD, IdMapping, NotFoundPolicy, Record,
    RecordId,
};
use object_rpc::ObjectStore;
use tracing::{debug, warn};

use crate::errors::ResolveError;

/// Outcome of resolving one relational field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The source value was empty; the field is left out and the record kept.
    Absent,
    /// Destination value to write.
    Resolved(FieldValue),
    /// No destination record could be determined.
    Unresolved,
}

pub struct RelationResolver {
    config_id: ConfigId,
    source: Arc<dyn ObjectStore>,
    destination: Arc<dyn ObjectStore>,
    mappings: Arc<dyn IdMappingRepository>,
    related_created: AtomicUsize,
}

impl RelationResolver {
    pub fn new(
        config_id: ConfigId,
        source: Arc<dyn ObjectStore>,
        destination: Arc<dyn ObjectStore>,
        mappings: Arc<dyn IdMappingRepository>,
    ) -> Self {
        Self {
            config_id,
            source,
            destination,
            mappings,
            related_created: AtomicUsize::new(0),
        }
    }

    /// Related records created in the destination by the `create` policy.
    pub fn related_created(&self) -> usize {
        self.related_created.load(Ordering::Relaxed)
    }

    /// Resolves a relational source value into its destination value.
    ///
    /// Single references resolve to an `IdRef`, lists to an `IdList` holding
    /// the resolved elements in input order. A list resolves only if at
    /// least one of its elements does.
    ///
    /// # Arguments
    ///
    /// * `field` - Relational field mapping the value belongs to
    /// * `value` - Source value, a bare id, an `[id, label]` pair or an id list
    ///
    /// # Returns
    ///
    /// * `Ok(Resolution)` - The outcome, including "absent" and "unresolved"
    /// * `Err(ResolveError)` - If the containing record must fail
    pub async fn resolve(&self, field: &FieldMapping, value: &FieldValue) -> Result<Resolution, ResolveError> {
        let Some(related_model) = field.related_model.as_deref().filter(|m| !m.is_empty()) else {
            return Ok(Resolution::Absent);
        };
        if field.is_one2many() {
            warn!(
                field = ?field.source_field,
                related_model,
                "one2many relations are not migrated"
            );
            return Ok(Resolution::Absent);
        }
        if value.is_empty() {
            return Ok(Resolution::Absent);
        }

        if value.is_multi() || field.field_type.as_ref().is_some_and(|t| t.is_multi_relation()) {
            let source_ids = value.as_ids();
            let mut resolved = Vec::with_capacity(source_ids.len());
            for source_id in source_ids {
                if let Some(dest_id) = self.resolve_id(field, related_model, source_id).await? {
                    resolved.push(dest_id);
                }
            }
            if resolved.is_empty() {
                return Ok(Resolution::Unresolved);
            }
            return Ok(Resolution::Resolved(FieldValue::IdList(resolved)));
        }

        let Some(source_id) = value.as_id() else {
            warn!(related_model, ?value, "relational value is not a record reference");
            return Ok(Resolution::Unresolved);
        };
        Ok(match self.resolve_id(field, related_model, source_id).await? {
            Some(dest_id) => Resolution::Resolved(FieldValue::IdRef(dest_id)),
            None => Resolution::Unresolved,
        })
    }

    async fn resolve_id(
        &self,
        field: &FieldMapping,
        related_model: &str,
        source_id: RecordId,
    ) -> Result<Option<RecordId>, ResolveError> {
        if let Some(dest_id) = self.mappings.lookup(self.config_id, related_model, source_id).await? {
            debug!(related_model, source_id, dest_id, "id mapping hit");
            return Ok(Some(dest_id));
        }

        let Some(search) = self.search_domain(field, related_model, source_id).await? else {
            return Ok(None);
        };

        let matches = self
            .destination
            .search(related_model, &search)
            .await
            .map_err(|e| ResolveError::destination(related_model, e))?;

        let dest_id = match matches.as_slice() {
            [] => match field.not_found {
                NotFoundPolicy::Skip => {
                    debug!(related_model, source_id, domain = %search, "no destination match");
                    None
                }
                NotFoundPolicy::Create => Some(self.create_related(related_model, source_id, &search).await?),
            },
            [single] => Some(*single),
            [first, ..] => match field.duplicate {
                DuplicatePolicy::First => Some(*first),
                DuplicatePolicy::Skip => {
                    debug!(related_model, source_id, matches = matches.len(), "ambiguous match skipped");
                    None
                }
                DuplicatePolicy::Error => {
                    return Err(ResolveError::DuplicateMatch {
                        model: related_model.to_string(),
                        source_id,
                        matches: matches.len(),
                    });
                }
            },
        };

        if let Some(dest_id) = dest_id {
            self.remember(related_model, source_id, dest_id).await?;
        }
        Ok(dest_id)
    }

    /// Builds the destination predicate from the related source record.
    ///
    /// `None` when nothing can be searched: no search fields configured, the
    /// source record cannot be read, or all its search values are empty.
    /// Losing the source connection is an error, not a miss.
    async fn search_domain(
        &self,
        field: &FieldMapping,
        related_model: &str,
        source_id: RecordId,
    ) -> Result<Option<Domain>, ResolveError> {
        if field.search_fields.is_empty() {
            debug!(related_model, source_id, "no search fields configured");
            return Ok(None);
        }

        let mut projection = field.search_fields.clone();
        if !projection.iter().any(|f| f == ID_FIELD) {
            projection.push(ID_FIELD.to_string());
        }

        let related = match self.source.read(related_model, &[source_id], &projection).await {
            Ok(records) => match records.into_iter().next() {
                Some(related) => related,
                None => return Ok(None),
            },
            Err(e) if e.is_connection() => return Err(ResolveError::connection("source", related_model, e)),
            Err(e) => {
                warn!(related_model, source_id, error = %e, "failed to read related source record");
                return Ok(None);
            }
        };

        let clauses: Vec<(String, FieldValue)> = field
            .search_fields
            .iter()
            .filter_map(|name| {
                let value = related.get(name)?;
                (!value.is_empty()).then(|| (name.clone(), value.to_bare()))
            })
            .collect();

        if clauses.is_empty() {
            debug!(related_model, source_id, "all search values are empty");
            return Ok(None);
        }
        Ok(Some(Domain::all_eq(clauses)))
    }

    async fn create_related(&self, related_model: &str, source_id: RecordId, search: &Domain) -> Result<RecordId, ResolveError> {
        let values: Record = leaf_values(search).collect();
        let dest_id = self
            .destination
            .create(related_model, &values)
            .await
            .map_err(|e| ResolveError::destination(related_model, e))?;
        self.related_created.fetch_add(1, Ordering::Relaxed);
        debug!(related_model, source_id, dest_id, "related record created");
        Ok(dest_id)
    }

    /// Stores the mapping unless an earlier resolution already did.
    async fn remember(&self, related_model: &str, source_id: RecordId, dest_id: RecordId) -> Result<(), ResolveError> {
        if self.mappings.lookup(self.config_id, related_model, source_id).await?.is_some() {
            return Ok(());
        }
        match self
            .mappings
            .insert(&IdMapping::new(self.config_id, related_model, source_id, dest_id))
            .await
        {
            Ok(()) | Err(RepositoryError::DuplicateKey { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// `(field, value)` pairs of the equality leaves of a predicate built by
/// [`RelationResolver::search_domain`].
fn leaf_values(domain: &Domain) -> Box<dyn Iterator<Item = (String, FieldValue)> + '_> {
    match domain {
        Domain::Leaf(c) => Box::new(std::iter::once((c.field.clone(), c.value.clone()))),
        Domain::And(children) | Domain::Or(children) => Box::new(children.iter().flat_map(leaf_values)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrator_repository::InMemoryIdMappingRepository;
    use migrator_shared::types::FieldType;
    use object_rpc::MockObjectStore;

    struct Fixture {
        source: Arc<MockObjectStore>,
        destination: Arc<MockObjectStore>,
        mappings: Arc<InMemoryIdMappingRepository>,
        resolver: RelationResolver,
    }

    fn fixture(source: MockObjectStore, destination: MockObjectStore) -> Fixture {
        let source = Arc::new(source);
        let destination = Arc::new(destination);
        let mappings = Arc::new(InMemoryIdMappingRepository::new());
        let resolver = RelationResolver::new(1, source.clone(), destination.clone(), mappings.clone());
        Fixture {
            source,
            destination,
            mappings,
            resolver,
        }
    }

    fn country_field() -> FieldMapping {
        FieldMapping::relation(1, "country_id", "nation", FieldType::Many2one, "res.country", &["code"])
    }

    fn source_countries() -> MockObjectStore {
        MockObjectStore::new()
            .with_record("res.country", Record::new().with("id", 10).with("code", "FR").with("name", "France"))
            .with_record("res.country", Record::new().with("id", 11).with("code", "DE").with("name", "Germany"))
    }

    #[tokio::test]
    async fn test_empty_value_is_absent() {
        let f = fixture(source_countries(), MockObjectStore::new());
        for value in [FieldValue::Null, FieldValue::Bool(false), FieldValue::IdList(vec![])] {
            assert_eq!(f.resolver.resolve(&country_field(), &value).await.unwrap(), Resolution::Absent);
        }
        assert_eq!(f.source.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_single_match_is_resolved_and_remembered() {
        let destination = MockObjectStore::new().with_record("res.country", Record::new().with("id", 70).with("code", "FR"));
        let f = fixture(source_countries(), destination);

        let resolution = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap();

        assert_eq!(resolution, Resolution::Resolved(FieldValue::IdRef(70)));
        assert_eq!(f.mappings.lookup(1, "res.country", 10).await.unwrap(), Some(70));
    }

    #[tokio::test]
    async fn test_bare_id_and_pair_resolve_identically() {
        let destination = MockObjectStore::new().with_record("res.country", Record::new().with("id", 70).with("code", "FR"));
        let f = fixture(source_countries(), destination);

        let bare = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap();
        let pair = f
            .resolver
            .resolve(&country_field(), &FieldValue::LabeledIdRef(10, "France".into()))
            .await
            .unwrap();

        assert_eq!(bare, pair);
    }

    #[tokio::test]
    async fn test_second_resolution_is_served_from_mapping() {
        let f = fixture(source_countries(), MockObjectStore::new());
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        let first = f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap();
        let second = f
            .resolver
            .resolve(&field, &FieldValue::LabeledIdRef(10, "France".into()))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(f.source.calls().read, 1);
        assert_eq!(f.destination.calls().search, 1);
        assert_eq!(f.destination.calls().create, 1);
    }

    #[tokio::test]
    async fn test_not_found_create_policy_creates_one_record() {
        let f = fixture(source_countries(), MockObjectStore::new());
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        let resolution = f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap();

        let created = f.destination.records("res.country");
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].get("code"), Some(&FieldValue::from("FR")));
        assert_eq!(resolution, Resolution::Resolved(FieldValue::IdRef(created[0].id().unwrap())));
        assert_eq!(f.resolver.related_created(), 1);
    }

    #[tokio::test]
    async fn test_not_found_skip_policy_creates_nothing() {
        let f = fixture(source_countries(), MockObjectStore::new());

        let resolution = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap();

        assert_eq!(resolution, Resolution::Unresolved);
        assert_eq!(f.destination.calls().create, 0);
        assert_eq!(f.mappings.count(1).await.unwrap(), 0);
    }

    fn duplicated_destination() -> MockObjectStore {
        MockObjectStore::new()
            .with_record("res.country", Record::new().with("id", 91).with("code", "FR"))
            .with_record("res.country", Record::new().with("id", 90).with("code", "FR"))
    }

    #[tokio::test]
    async fn test_duplicate_first_takes_lowest_id() {
        let f = fixture(source_countries(), duplicated_destination());
        let resolution = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(FieldValue::IdRef(90)));
    }

    #[tokio::test]
    async fn test_duplicate_skip() {
        let f = fixture(source_countries(), duplicated_destination());
        let field = country_field().with_policies(NotFoundPolicy::Skip, DuplicatePolicy::Skip);

        assert_eq!(f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap(), Resolution::Unresolved);
        assert_eq!(f.mappings.count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_error() {
        let f = fixture(source_countries(), duplicated_destination());
        let field = country_field().with_policies(NotFoundPolicy::Skip, DuplicatePolicy::Error);

        let err = f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap_err();
        assert!(matches!(err, ResolveError::DuplicateMatch { matches: 2, source_id: 10, .. }));
    }

    #[tokio::test]
    async fn test_empty_search_fields_never_call_remote() {
        let f = fixture(source_countries(), MockObjectStore::new());
        let field = FieldMapping::relation(1, "country_id", "nation", FieldType::Many2one, "res.country", &[])
            .with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        assert_eq!(f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap(), Resolution::Unresolved);
        assert_eq!(f.source.calls().total(), 0);
        assert_eq!(f.destination.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_missing_related_source_record_is_unresolved() {
        let f = fixture(source_countries(), MockObjectStore::new());
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        assert_eq!(f.resolver.resolve(&field, &FieldValue::Integer(99)).await.unwrap(), Resolution::Unresolved);
        assert_eq!(f.destination.calls().create, 0);
    }

    #[tokio::test]
    async fn test_empty_search_values_are_unresolved() {
        let source = MockObjectStore::new().with_record("res.country", Record::new().with("id", 12).with("code", false));
        let f = fixture(source, MockObjectStore::new());
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        assert_eq!(f.resolver.resolve(&field, &FieldValue::Integer(12)).await.unwrap(), Resolution::Unresolved);
        assert_eq!(f.destination.calls().search, 0);
    }

    #[tokio::test]
    async fn test_many2many_keeps_order_and_drops_unresolved() {
        let source = MockObjectStore::new()
            .with_record("res.partner.category", Record::new().with("id", 1).with("name", "Vendor"))
            .with_record("res.partner.category", Record::new().with("id", 2).with("name", "Unknown"))
            .with_record("res.partner.category", Record::new().with("id", 3).with("name", "Customer"));
        let destination = MockObjectStore::new()
            .with_record("res.partner.category", Record::new().with("id", 50).with("name", "Customer"))
            .with_record("res.partner.category", Record::new().with("id", 60).with("name", "Vendor"));
        let f = fixture(source, destination);
        let field = FieldMapping::relation(
            2,
            "category_id",
            "category_id",
            FieldType::Many2many,
            "res.partner.category",
            &["name"],
        );

        let resolution = f.resolver.resolve(&field, &FieldValue::IdList(vec![3, 2, 1])).await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(FieldValue::IdList(vec![50, 60])));

        let none = f.resolver.resolve(&field, &FieldValue::IdList(vec![2])).await.unwrap();
        assert_eq!(none, Resolution::Unresolved);
    }

    #[tokio::test]
    async fn test_one2many_is_never_resolved() {
        let f = fixture(source_countries(), MockObjectStore::new());
        let field = FieldMapping::relation(3, "child_ids", "child_ids", FieldType::One2many, "res.partner", &["name"]);

        let resolution = f.resolver.resolve(&field, &FieldValue::IdList(vec![1, 2])).await.unwrap();
        assert_eq!(resolution, Resolution::Absent);
        assert_eq!(f.source.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_mapping_store_failure_propagates() {
        let f = fixture(source_countries(), MockObjectStore::new());
        f.mappings.set_fail_lookups(true);

        let err = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap_err();
        assert!(matches!(err, ResolveError::MappingStore(_)));
    }

    #[tokio::test]
    async fn test_related_record_is_read_with_its_id() {
        let destination = MockObjectStore::new().with_record("res.country", Record::new().with("id", 70).with("code", "FR"));
        let f = fixture(source_countries(), destination);
        f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap();

        assert_eq!(f.source.read_projections(), vec![vec!["code".to_string(), "id".to_string()]]);
    }

    #[tokio::test]
    async fn test_source_read_fault_is_unresolved() {
        let f = fixture(source_countries(), MockObjectStore::new());
        f.source.fail_reads("res.country", "access denied");
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        assert_eq!(f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap(), Resolution::Unresolved);
        assert_eq!(f.destination.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_source_connection_loss_is_an_error() {
        let f = fixture(source_countries(), MockObjectStore::new());
        f.source.disconnect();
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        let err = f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap_err();
        assert!(matches!(err, ResolveError::Connection { store: "source", .. }));
        assert_eq!(f.destination.calls().create, 0);
        assert_eq!(f.mappings.count(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_destination_connection_loss_is_an_error() {
        let f = fixture(source_countries(), MockObjectStore::new());
        f.destination.disconnect();

        let err = f.resolver.resolve(&country_field(), &FieldValue::Integer(10)).await.unwrap_err();
        assert!(err.is_connection());
        assert!(matches!(err, ResolveError::Connection { store: "destination", .. }));
    }

    #[tokio::test]
    async fn test_destination_fault_is_not_a_connection_loss() {
        let f = fixture(source_countries(), MockObjectStore::new());
        f.destination.fail_creates("res.country", "constraint violated");
        let field = country_field().with_policies(NotFoundPolicy::Create, DuplicatePolicy::First);

        let err = f.resolver.resolve(&field, &FieldValue::Integer(10)).await.unwrap_err();
        assert!(matches!(err, ResolveError::Destination { .. }));
        assert!(!err.is_connection());
    }

    #[tokio::test]
    async fn test_relational_search_values_compare_by_id() {
        let source = MockObjectStore::new().with_record(
            "res.country.state",
            Record::new()
                .with("id", 5)
                .with("code", "IDF")
                .with("country_id", FieldValue::LabeledIdRef(10, "France".into())),
        );
        let destination = MockObjectStore::new().with_record(
            "res.country.state",
            Record::new().with("id", 8).with("code", "IDF").with("country_id", 10),
        );
        let f = fixture(source, destination);
        let field = FieldMapping::relation(
            4,
            "state_id",
            "state_id",
            FieldType::Many2one,
            "res.country.state",
            &["code", "country_id"],
        );

        let resolution = f.resolver.resolve(&field, &FieldValue::Integer(5)).await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(FieldValue::IdRef(8)));
    }
}
