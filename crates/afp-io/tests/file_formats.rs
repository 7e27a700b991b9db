use afp_adapter_csv::{ColumnSpec, CsvOptions, FieldSpec, FixedWidth};
use afp_io::{
    DbfCodec, DbfFieldDescriptor, DbfLayout, Error, ExportOptions, Exporter, FileFormat,
    ImportOptions, Importer, JoinSpec, read_from_file,
};
use afp_model::{Entity, EntityRegistry, Record, SubTable, Value};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn invoice() -> Entity {
    let mut lines = SubTable::with_fields("Lines", ["Item", "Qty", "Article"]);
    lines.append_record([
        ("Item", Some(Value::from("A"))),
        ("Qty", Some(Value::Integer(1))),
        ("Article", Some(Value::Integer(10))),
    ]);
    lines.append_record([
        ("Item", Some(Value::from("B"))),
        ("Qty", Some(Value::Integer(2))),
        ("Article", Some(Value::Integer(20))),
    ]);

    let mut articles = SubTable::new("Articles");
    articles.append_record([
        ("Id", Some(Value::Integer(10))),
        ("Text", Some(Value::from("Bolt, zinc"))),
    ]);
    articles.append_record([("Id", Some(Value::Integer(20))), ("Text", Some(Value::from("Nut")))]);

    Entity::new("shop.Invoice")
        .with_name("INV-1")
        .with_default_table("Lines")
        .with_table(lines)
        .with_table(articles)
}

#[test]
fn scenario_a_csv_index_mapping() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("people.csv");
    fs::write(&path, "Ann,34\n")?;

    let options = ImportOptions::new()
        .with_csv(CsvOptions::new().without_quotes())
        .with_columns(ColumnSpec::new().index("Name", 0).index("Age", 1));
    let entities = read_from_file(&path, Entity::new("Person"), &options)?;

    let table = entities[0].primary_table().expect("default table");
    assert_eq!(table.len(), 1);
    assert_eq!(table.value(0, "Name"), Some(&Value::from("Ann")));
    assert_eq!(table.value(0, "Age"), Some(&Value::Integer(34)));
    Ok(())
}

#[test]
fn scenario_c_xml_rows_in_order_and_reimport_equal() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("invoice.xml");
    let original = invoice();

    let report = Exporter::single(&original).write_to_file(&path)?;
    assert!(report.written);
    assert_eq!(report.format, Some(FileFormat::Xml));

    let xml = fs::read_to_string(&path)?;
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(r#"xmlns="http://www.afptech.de/XML/AfpDocument""#));
    let first = xml.find(r#"<AfpValue name="Item">A</AfpValue>"#).expect("row A");
    let second = xml.find(r#"<AfpValue name="Item">B</AfpValue>"#).expect("row B");
    assert!(first < second);

    let mut registry = EntityRegistry::new();
    registry.register_prototype(original.initialized_copy());
    let imported = Importer::new()
        .with_registry(registry)
        .read_from_file(&path, Entity::new("unused"))?;
    assert_eq!(imported, vec![original]);
    Ok(())
}

#[test]
fn scenario_d_fixed_width_export() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stock.ASC");

    let mut entity = Entity::new("Stock");
    entity.primary_table_mut().append_record([
        ("Qty", Some(Value::Integer(12))),
        ("Code", Some(Value::from("abc"))),
        ("Text", Some(Value::from("abcdef"))),
    ]);

    let options = ExportOptions::new()
        .with_field_names(["Qty", "Code", "Text"])
        .with_fixed(FixedWidth::new(5));
    let report = Exporter::single(&entity)
        .with_options(options)
        .write_to_file(&path)?;

    assert_eq!(report.rows, 1);
    assert_eq!(fs::read_to_string(&path)?, "   12abc  abcde\n");
    Ok(())
}

#[test]
fn csv_round_trip_with_delimiter_in_value() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("lines.csv");

    let mut entity = Entity::new("T");
    entity.primary_table_mut().append_record([
        ("Name", Some(Value::from("Doe, Jr."))),
        ("Code", Some(Value::from("007"))),
    ]);
    Exporter::single(&entity).write_to_file(&path)?;
    assert_eq!(fs::read_to_string(&path)?, "\"Doe, Jr.\",007\n");

    let options = ImportOptions::new().with_columns(ColumnSpec::positional(["Name", "Code"]));
    let imported = read_from_file(&path, Entity::new("T"), &options)?;
    let table = imported[0].primary_table().expect("table");
    assert_eq!(table.value(0, "Name"), Some(&Value::from("Doe, Jr.")));
    // Scalars are re-inferred on import
    assert_eq!(table.value(0, "Code"), Some(&Value::Integer(7)));
    Ok(())
}

#[test]
fn csv_quotes_values_containing_any_delimiter() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("pairs.csv");
    let csv = CsvOptions::new().delimiters(";,");

    let mut entity = Entity::new("T");
    entity
        .primary_table_mut()
        .append_record([("a", Some(Value::from("x,y"))), ("b", Some(Value::from("z")))]);
    Exporter::single(&entity)
        .with_options(ExportOptions::new().with_csv(csv.clone()))
        .write_to_file(&path)?;
    assert_eq!(fs::read_to_string(&path)?, "\"x,y\";z\n");

    let options = ImportOptions::new()
        .with_csv(csv)
        .with_columns(ColumnSpec::positional(["a", "b"]));
    let imported = read_from_file(&path, Entity::new("T"), &options)?;
    let table = imported[0].primary_table().expect("table");
    assert_eq!(table.value(0, "a"), Some(&Value::from("x,y")));
    assert_eq!(table.value(0, "b"), Some(&Value::from("z")));
    Ok(())
}

#[test]
fn xml_round_trip_without_prototype_keeps_schema() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sparse.xml");

    let mut table = SubTable::with_fields("Main", ["A", "B"]);
    table.append_record([("A", None), ("B", Some(Value::from("b0")))]);
    let original = Entity::new("T").with_table(table);

    Exporter::single(&original).write_to_file(&path)?;
    let imported = read_from_file(&path, Entity::new("T"), &ImportOptions::new())?;
    assert_eq!(imported, vec![original]);
    Ok(())
}

#[test]
fn joined_columns_are_flattened_into_csv() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("joined.csv");
    let entity = invoice();

    let options = ExportOptions::new().with_fields(vec![
        FieldSpec::new("Item"),
        FieldSpec::new("ArticleText"),
    ]);
    let mut exporter = Exporter::single(&entity).with_options(options);
    exporter.append_data(
        JoinSpec::new("Article", "Articles", "Id").column_as("Text", "ArticleText"),
        None,
    );
    exporter.write_to_file(&path)?;

    assert_eq!(fs::read_to_string(&path)?, "A,\"Bolt, zinc\"\nB,Nut\n");
    Ok(())
}

#[test]
fn joins_use_external_source_when_given() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("joined.asc");
    let entity = invoice();

    let mut catalog_table = SubTable::new("Catalog");
    catalog_table.append_record([
        ("No", Some(Value::Integer(20))),
        ("Price", Some(Value::Decimal(0.5))),
    ]);
    let catalog = Entity::new("Catalog").with_table(catalog_table);

    let mut exporter = Exporter::single(&entity).with_options(
        ExportOptions::new().with_fixed(FixedWidth::new(4)),
    );
    exporter.append_data(JoinSpec::new("Article", "Catalog", "No").column("Price"), Some(&catalog));
    exporter.write_to_file(&path)?;

    // Schema fields, then the joined column
    assert_eq!(
        fs::read_to_string(&path)?,
        "A      1  10    \nB      2  20 0.5\n"
    );
    Ok(())
}

#[test]
fn replacing_options_does_not_repeat_their_joins() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("lines.csv");
    let entity = invoice();
    let options =
        ExportOptions::new().with_join(JoinSpec::new("Article", "Articles", "Id").column("Text"));

    Exporter::single(&entity)
        .with_options(options.clone())
        .with_options(options)
        .write_to_file(&path)?;

    assert_eq!(
        fs::read_to_string(&path)?,
        "A,1,10,\"Bolt, zinc\"\nB,2,20,Nut\n"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn exported_files_are_not_owner_only() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let fresh = dir.path().join("fresh.csv");
    Exporter::single(&invoice()).write_to_file(&fresh)?;
    assert_eq!(fs::metadata(&fresh)?.permissions().mode() & 0o777, 0o644);

    let existing = dir.path().join("existing.xml");
    fs::write(&existing, "old")?;
    fs::set_permissions(&existing, fs::Permissions::from_mode(0o640))?;
    Exporter::single(&invoice()).write_to_file(&existing)?;
    assert_eq!(fs::metadata(&existing)?.permissions().mode() & 0o777, 0o640);
    assert_ne!(fs::read_to_string(&existing)?, "old");
    Ok(())
}

#[test]
fn failed_export_leaves_no_file() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("broken.csv");
    let entity = invoice();

    let mut exporter = Exporter::single(&entity);
    exporter.append_data(JoinSpec::new("Article", "NoSuchTable", "Id").column("Text"), None);
    let err = exporter.write_to_file(&path).unwrap_err();

    assert!(matches!(err, Error::Model(_)));
    assert!(!path.exists());
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn unsupported_extension_writes_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("report.pdf");

    let report = Exporter::single(&invoice()).write_to_file(&path)?;
    assert!(!report.written);
    assert_eq!(report.format, None);
    assert!(!path.exists());
    Ok(())
}

#[test]
fn embedded_data_is_exported_and_reimported() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("order.xml");

    let mut order = Entity::new("Order").with_name("O-1");
    order
        .primary_table_mut()
        .append_record([("No", Some(Value::Integer(1)))]);
    let mut position = Entity::new("Position").with_name("P-1");
    position
        .primary_table_mut()
        .append_record([("Sku", Some(Value::from("X")))]);
    order.set_embedded("Positions", vec![position]);

    let mut exporter = Exporter::single(&order);
    exporter.add_embedded_data("Positions").add_embedded_data("Missing");
    exporter.write_to_file(&path)?;

    let imported = read_from_file(&path, Entity::new("Order"), &ImportOptions::new())?;
    assert_eq!(imported, vec![order]);
    Ok(())
}

#[derive(Default)]
struct RecordingDbf {
    writes: Mutex<Vec<(PathBuf, DbfLayout, Vec<Record>)>>,
}

impl DbfCodec for RecordingDbf {
    fn read(&self, _path: &Path, mut target: Entity) -> afp_io::Result<Vec<Entity>> {
        target
            .primary_table_mut()
            .append_record([("from_dbf", Some(Value::Boolean(true)))]);
        Ok(vec![target])
    }

    fn write(&self, path: &Path, layout: &DbfLayout, records: &[Record]) -> afp_io::Result<()> {
        self.writes
            .lock()
            .map_err(|_| afp_io::Error::dbf("poisoned"))?
            .push((path.to_path_buf(), layout.clone(), records.to_vec()));
        Ok(())
    }
}

#[test]
fn dbf_without_codec_is_skipped() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("table.dbf");

    let report = Exporter::single(&invoice()).write_to_file(&path)?;
    assert!(!report.written);
    assert_eq!(report.format, Some(FileFormat::Dbf));
    assert!(!path.exists());
    Ok(())
}

#[test]
fn dbf_codec_receives_layout_and_records() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("table.dbf");
    let codec = Arc::new(RecordingDbf::default());

    let options = ExportOptions::new()
        .with_fields(vec![FieldSpec::new("Item").with_width(8), FieldSpec::new("Qty")]);
    let report = Exporter::single(&invoice())
        .with_options(options)
        .with_dbf_codec(codec.clone())
        .write_to_file(&path)?;
    assert!(report.written);
    assert_eq!(report.rows, 2);

    let writes = codec.writes.lock().expect("lock");
    let (written_path, layout, records) = &writes[0];
    assert_eq!(written_path, &path);
    assert_eq!(
        layout,
        &DbfLayout::Fields(vec![
            DbfFieldDescriptor::new("Item", "C").with_param("8"),
            DbfFieldDescriptor::new("Qty", "C").with_param("10"),
        ])
    );
    assert_eq!(records.len(), 2);

    let imported = Importer::new()
        .with_dbf_codec(codec.clone())
        .read_from_file(&path, Entity::new("T"))?;
    assert_eq!(
        imported[0].primary_table().and_then(|t| t.value(0, "from_dbf")),
        Some(&Value::Boolean(true))
    );
    Ok(())
}
