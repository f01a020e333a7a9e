use sheet_merger::read_grid;
use sheet_merger::write_grid;
use sheet_merger::ColumnMapping;
use sheet_merger::Config;
use sheet_merger::FillOptions;
use sheet_merger::JoinMode;
use sheet_merger::Session;
use sheet_merger::Source;
use sheet_merger::Value;
use sheet_merger::Workspace;
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

fn template_bytes() -> Vec<u8> {
    let rows = vec![
        vec![Value::from("No"), Value::from("Item"), Value::from("Stock"), Value::from("Stock")],
        vec![Value::Null, Value::Null, Value::from("Start"), Value::from("End")],
        vec![Value::Int(7), Value::from("bolt"), Value::Int(10), Value::Null],
        vec![Value::Int(8), Value::from("nut"), Value::Int(20), Value::Null],
        vec![Value::Int(9), Value::from("gear"), Value::Int(30), Value::Null],
    ];
    write_grid("Inventory", &rows, Cursor::new(Vec::new())).unwrap().into_inner()
}

fn mapping() -> ColumnMapping {
    [("Item", "part"), ("Stock - End", "count")]
        .iter()
        .map(|(template, source)| (template.to_string(), source.to_string()))
        .collect()
}

fn setup() -> (TempDir, Workspace, Source) {
    let directory = TempDir::new().unwrap();
    let workspace = Workspace::new(Config {
        home: directory.path().to_path_buf(),
        ..Config::default()
    });
    let csv = directory.path().join("counts.csv");
    fs::write(&csv, "part,count\nnut,18\nbolt,4\n").unwrap();
    (directory, workspace, Source::path(csv))
}

#[test]
fn fills_the_installed_template() {
    let (_directory, workspace, csv) = setup();
    let mut session = Session::new();
    workspace.install_template(&template_bytes(), &mut session).unwrap();

    let template = workspace.load_template("Inventory").unwrap();
    assert_eq!(template.column_names(), vec!["No", "Item", "Stock - Start", "Stock - End"]);
    let source = sheet_merger::load(&csv, None).unwrap();

    session.confirm(mapping(), vec![]).unwrap();
    let filled = session.fill(&template, &source, FillOptions::default()).unwrap();
    let path = workspace.write_filled(&filled, None).unwrap();
    assert_eq!(path, workspace.config().filled_output_path());

    let rows = read_grid(&Source::path(&path), "Sheet1").unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Value::from("No"), Value::from("Item"), Value::from("Stock - Start"), Value::from("Stock - End")],
            vec![Value::Int(1), Value::from("nut"), Value::Int(10), Value::Int(18)],
            vec![Value::Int(2), Value::from("bolt"), Value::Int(20), Value::Int(4)],
            vec![Value::Int(3), Value::Null, Value::Int(30), Value::Null],
        ]
    );
}

#[test]
fn merges_with_a_saved_mapping() {
    let (_directory, workspace, csv) = setup();
    let mut session = Session::new();
    workspace.install_template(&template_bytes(), &mut session).unwrap();

    session.confirm(mapping(), vec!["Item".to_owned()]).unwrap();
    session.save(workspace.mappings(), "inventory").unwrap();
    assert_eq!(workspace.mappings().list().unwrap(), vec!["inventory"]);

    let mut restored = Session::new();
    restored.apply(workspace.mappings().load("inventory.json").unwrap());
    assert_eq!(restored, session);

    let template = workspace.load_template("Inventory").unwrap();
    let source = sheet_merger::load(&csv, None).unwrap();
    let merged = restored.merge(&template, &source, JoinMode::Left).unwrap();
    assert_eq!(merged.column_names(), vec!["No", "part", "Stock - Start", "count_A", "count_B"]);
    assert_eq!(
        merged.column("count_B").unwrap().values,
        vec![Value::Int(4), Value::Int(18), Value::Null]
    );

    let path = workspace.write_merged(&merged, None).unwrap();
    let rows = read_grid(&Source::path(&path), "Sheet1").unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[3][1], Value::from("gear"));
}
