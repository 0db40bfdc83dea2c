#![allow(dead_code)]

use attrfilters::catalog::{Catalog, CatalogBuilder, ImportReport};
use attrfilters::rows::TableKind;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// In-memory copy of the four exported tables, writable as gzipped CSV.
#[derive(Default)]
pub struct Tables {
    next: u64,
    rows: BTreeMap<TableKind, Vec<Vec<String>>>,
}

fn uuid(n: u64) -> String {
    format!("00000000-0000-4000-8000-{:012x}", n)
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_uuid(&mut self) -> String {
        self.next += 1;
        uuid(self.next)
    }

    fn push(&mut self, kind: TableKind, fields: Vec<String>) {
        self.rows.entry(kind).or_default().push(fields);
    }

    pub fn attribute(&mut self, title: &str, display_order: i64) -> String {
        let id = self.next_uuid();
        let fields = vec![
            id.clone(),
            "enum".into(),
            "f".into(),
            "f".into(),
            "f".into(),
            title.into(),
            display_order.to_string(),
            "2021-01-01 00:00:00".into(),
            "2021-01-01 00:00:00".into(),
            "t".into(),
            "single_select".into(),
            "1".into(),
        ];
        self.push(TableKind::Attribute, fields);
        id
    }

    pub fn option(&mut self, attribute: &str, title: &str, display_order: i64) -> String {
        let id = self.next_uuid();
        let fields = vec![
            id.clone(),
            attribute.into(),
            title.into(),
            "f".into(),
            display_order.to_string(),
            "2021-01-01 00:00:00".into(),
            "2021-01-01 00:00:00".into(),
            "".into(),
            "".into(),
        ];
        self.push(TableKind::AttributeOption, fields);
        id
    }

    pub fn assign(&mut self, category_id: u32, attribute: &str) {
        let id = self.next_uuid();
        let fields = vec![id, category_id.to_string(), attribute.into(), "f".into()];
        self.push(TableKind::CategoryAttribute, fields);
    }

    pub fn dynamic(&mut self, category_id: u32, option: &str, precondition: &str) {
        let id = self.next_uuid();
        let fields = vec![
            id,
            category_id.to_string(),
            option.into(),
            precondition.into(),
            "f".into(),
        ];
        self.push(TableKind::DynamicAttributeOption, fields);
    }

    pub fn gate(&mut self, category_id: u32, option: &str, triggers: &[&str]) {
        let precondition = format!("{{{}}}", triggers.join(","));
        self.dynamic(category_id, option, &precondition);
    }

    /// Compiles and pre-sorts, like an import from disk.
    pub fn compile(&self) -> (Catalog, ImportReport) {
        let mut builder = CatalogBuilder::new();
        for (kind, rows) in &self.rows {
            for fields in rows {
                builder.add_fields(*kind, fields.as_slice()).unwrap();
            }
        }
        let (mut catalog, report) = builder.finish();
        catalog.presort();
        (catalog, report)
    }

    pub fn write_to(&self, dir: &Path) {
        for kind in TableKind::LOAD_ORDER {
            let file = File::create(dir.join(kind.file_prefix())).unwrap();
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(GzEncoder::new(file, Compression::default()));
            writer.write_record([kind.name(), "header"]).unwrap();
            for fields in self.rows.get(&kind).into_iter().flatten() {
                writer.write_record(fields).unwrap();
            }
            writer.into_inner().unwrap().finish().unwrap();
        }
    }
}

pub fn id(catalog: &Catalog, uuid: &str) -> u32 {
    catalog.registry().lookup(uuid).unwrap()
}

pub const CATEGORY: u32 = 242;

/// Category 242 with 15 attributes of 3 options each. Attributes 0-4 are
/// always visible; attribute `k >= 5` is unlocked by option 0 of attribute
/// `k % 5`.
pub struct Scenario {
    pub tables: Tables,
    pub attributes: Vec<String>,
    pub options: Vec<Vec<String>>,
}

impl Scenario {
    pub fn new() -> Self {
        let mut tables = Tables::new();
        let mut attributes = Vec::new();
        let mut options = Vec::new();
        for a in 0..15 {
            let attribute = tables.attribute(&format!("Attribute {a}"), a);
            let opts: Vec<String> = (0..3)
                .map(|o| tables.option(&attribute, &format!("Option {a}.{o}"), o))
                .collect();
            tables.assign(CATEGORY, &attribute);
            attributes.push(attribute);
            options.push(opts);
        }
        for a in 5..15 {
            let trigger = options[(a % 5) as usize][0].clone();
            for option in options[a as usize].clone() {
                tables.gate(CATEGORY, &option, &[&trigger]);
            }
        }
        Self {
            tables,
            attributes,
            options,
        }
    }
}
