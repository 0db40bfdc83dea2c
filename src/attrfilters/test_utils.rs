use crate::catalog::{Catalog, CatalogBuilder, ImportReport};
use crate::ids::IdRegistry;
use crate::rows::TableKind;
use uuid::Uuid;

/// Deterministic source UUID for a fixture key.
pub fn uuid_for(key: u64) -> String {
    Uuid::from_u128(key as u128).hyphenated().to_string()
}

/// Builds raw table rows for tests and compiles them like the importer does.
///
/// Entities are referred to by small integer keys; [`Fixture::id`] maps a key to
/// the catalog ID it received in the last [`Fixture::compile`].
#[derive(Default)]
pub struct Fixture {
    next_key: u64,
    rows: Vec<(TableKind, Vec<String>)>,
    registry: IdRegistry,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            next_key: 1,
            ..Self::default()
        }
    }

    fn key(&mut self) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    fn push(&mut self, kind: TableKind, fields: Vec<String>) {
        self.rows.push((kind, fields));
    }

    pub fn attribute(&mut self, title: &str, display_order: i64) -> u64 {
        let key = self.key();
        let fields = vec![
            uuid_for(key),
            "enum".into(),
            "f".into(),
            "f".into(),
            "f".into(),
            title.into(),
            display_order.to_string(),
            "".into(),
            "".into(),
            "t".into(),
            "single_select".into(),
            "1".into(),
        ];
        self.push(TableKind::Attribute, fields);
        key
    }

    pub fn option(&mut self, attribute: u64, title: &str, display_order: i64) -> u64 {
        let key = self.key();
        let fields = vec![
            uuid_for(key),
            uuid_for(attribute),
            title.into(),
            "f".into(),
            display_order.to_string(),
            "".into(),
            "".into(),
            "".into(),
            "".into(),
        ];
        self.push(TableKind::AttributeOption, fields);
        key
    }

    pub fn assign(&mut self, category_id: u32, attribute: u64) {
        self.assignment(category_id, attribute, false);
    }

    pub fn assign_disabled(&mut self, category_id: u32, attribute: u64) {
        self.assignment(category_id, attribute, true);
    }

    fn assignment(&mut self, category_id: u32, attribute: u64, disabled: bool) {
        let key = self.key();
        let fields = vec![
            uuid_for(key),
            category_id.to_string(),
            uuid_for(attribute),
            (if disabled { "t" } else { "f" }).to_string(),
        ];
        self.push(TableKind::CategoryAttribute, fields);
    }

    /// A dynamic option row with a raw precondition string.
    pub fn dynamic(&mut self, category_id: u32, option: u64, precondition: &str) {
        let key = self.key();
        let fields = vec![
            uuid_for(key),
            category_id.to_string(),
            uuid_for(option),
            precondition.into(),
            "f".into(),
        ];
        self.push(TableKind::DynamicAttributeOption, fields);
    }

    /// Makes `option` visible only when one of `triggers` is selected.
    pub fn gate(&mut self, category_id: u32, option: u64, triggers: &[u64]) {
        let uuids: Vec<String> = triggers.iter().map(|t| uuid_for(*t)).collect();
        let precondition = format!("{{{}}}", uuids.join(","));
        self.dynamic(category_id, option, &precondition);
    }

    /// Raw rows of one table, in insertion order.
    pub fn table(&self, kind: TableKind) -> Vec<&[String]> {
        self.rows
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, fields)| fields.as_slice())
            .collect()
    }

    fn builder(&self) -> CatalogBuilder {
        let mut rows: Vec<&(TableKind, Vec<String>)> = self.rows.iter().collect();
        rows.sort_by_key(|(kind, _)| *kind);

        let mut builder = CatalogBuilder::new();
        for (kind, fields) in rows {
            builder
                .add_fields(*kind, fields.as_slice())
                .expect("fixture rows are valid");
        }
        builder
    }

    pub fn builder_registry_len(&self) -> usize {
        self.builder().registry().len()
    }

    pub fn compile(&mut self) -> (Catalog, ImportReport) {
        let (catalog, report) = self.builder().finish();
        self.registry = catalog.registry().clone();
        (catalog, report)
    }

    /// Catalog ID of a fixture key, after [`compile`](Self::compile).
    pub fn id(&self, key: u64) -> u32 {
        self.registry
            .lookup(&uuid_for(key))
            .expect("key was registered by the last compile")
    }
}
