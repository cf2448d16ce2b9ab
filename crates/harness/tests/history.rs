use erd_core::{EditorConfig, PropertyValue};
use erd_engine::{ElementStore, EngineError, PropertyChangeTracker, UndoManager};
use erd_harness::{Diagram, EditorSession, Table, init_tracing};

fn table_name(session: &EditorSession, id: erd_core::ElementId) -> Option<String> {
    session.diagram().table(id).map(|t| t.name().to_string())
}

// ============================================================================
// Snapshot diffs
// ============================================================================

#[test]
fn rename_through_tracker_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut diagram = Diagram::new();
    let table = Table::new("orders").with_columns(&["id", "total"]);
    let id = erd_core::Element::id(&table);
    ElementStore::<Table>::insert(&mut diagram, table)?;

    let history = UndoManager::<Diagram>::new();
    let mut tracker = PropertyChangeTracker::<Table>::new();
    tracker.start_tracking_property_change(diagram.table(id).ok_or("missing table")?);
    diagram.table_mut(id).ok_or("missing table")?.set_name("clients");
    let compound = tracker.stop_tracking_property_change(&diagram);
    assert_eq!(compound.len(), 1);

    history.add(compound);
    assert!(history.undo_command(&mut diagram)?);
    assert_eq!(diagram.table(id).map(Table::name), Some("orders"));
    assert!(history.redo_command(&mut diagram)?);
    assert_eq!(diagram.table(id).map(Table::name), Some("clients"));
    Ok(())
}

#[test]
fn free_form_edit_is_one_step() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &["id"])?;

    let changed = session.edit_table(id, |table| {
        table.set_name("clients");
        table.add_column("email");
        table.comment_mut().set_text("customer master data");
    })?;
    assert_eq!(changed, 3);
    assert_eq!(session.history().undo_depth(), 2);

    assert!(session.undo()?);
    let table = session.diagram().table(id).ok_or("missing table")?;
    assert_eq!(table.name(), "orders");
    assert_eq!(table.columns(), ["id"]);
    assert_eq!(table.comment().text(), "");

    assert!(session.redo()?);
    let table = session.diagram().table(id).ok_or("missing table")?;
    assert_eq!(table.columns(), ["id", "email"]);
    assert_eq!(table.comment().text(), "customer master data");
    Ok(())
}

// ============================================================================
// Recorded property writes
// ============================================================================

#[test]
fn property_write_is_recorded_by_listener() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &[])?;

    assert!(session.set_table_property(id, "name", PropertyValue::text("clients"))?);
    assert_eq!(session.history().undo_depth(), 2);

    assert!(session.undo()?);
    assert_eq!(table_name(&session, id).as_deref(), Some("orders"));
    // The replay notified the recorder again, but nothing was recorded.
    assert_eq!(session.history().undo_depth(), 1);
    assert_eq!(session.history().redo_depth(), 1);

    assert!(session.redo()?);
    assert_eq!(table_name(&session, id).as_deref(), Some("clients"));
    assert_eq!(session.history().undo_depth(), 2);
    Ok(())
}

#[test]
fn new_edit_discards_redo() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &[])?;

    session.set_table_property(id, "name", PropertyValue::text("clients"))?;
    session.undo()?;
    session.set_table_property(id, "name", PropertyValue::text("invoices"))?;

    assert!(!session.redo()?);
    assert_eq!(table_name(&session, id).as_deref(), Some("invoices"));
    Ok(())
}

#[test]
fn read_only_write_records_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &["id"])?;

    assert!(!session.set_table_property(id, "primary_key", PropertyValue::text("total"))?);
    assert_eq!(session.history().undo_depth(), 1);
    Ok(())
}

#[test]
fn rejected_value_leaves_history_alone() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    let a = session.add_table("a", &[])?;
    let b = session.add_table("b", &[])?;
    let link = session.connect(a, b)?;

    let err = session
        .set_association_property(link, "directionality", PropertyValue::text("up"))
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(_)));
    assert_eq!(session.history().undo_depth(), 3);
    Ok(())
}

// ============================================================================
// Tracking brackets
// ============================================================================

#[test]
fn nested_brackets_undo_together() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &["id"])?;

    session.history().start_tracking();
    session.set_table_property(id, "name", PropertyValue::text("clients"))?;
    session.history().start_tracking();
    session.set_table_property(id, "columns", PropertyValue::List(vec!["key".into()]))?;
    session.history().end_tracking();
    assert_eq!(session.history().undo_depth(), 1);
    session.history().end_tracking();
    assert_eq!(session.history().undo_depth(), 2);

    assert!(session.undo()?);
    let table = session.diagram().table(id).ok_or("missing table")?;
    assert_eq!(table.name(), "orders");
    assert_eq!(table.columns(), ["id"]);
    Ok(())
}

#[test]
fn empty_bracket_keeps_history() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    session.add_table("orders", &[])?;

    session.history().start_tracking();
    session.history().end_tracking();
    assert_eq!(session.history().undo_depth(), 1);
    assert!(!session.history().can_redo());
    Ok(())
}

// ============================================================================
// Structural edits
// ============================================================================

#[test]
fn remove_table_takes_its_associations() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let orders = session.add_table("orders", &["id"])?;
    let clients = session.add_table("clients", &["id"])?;
    let items = session.add_table("items", &["id"])?;
    session.connect(orders, clients)?;
    session.connect(items, orders)?;
    let before = session.diagram().contents();

    session.remove_table(orders)?;
    assert_eq!(session.diagram().table_count(), 2);
    assert_eq!(session.diagram().association_count(), 0);
    assert_eq!(session.history().undo_depth(), 6);

    assert!(session.undo()?);
    assert_eq!(session.diagram().contents(), before);

    assert!(session.redo()?);
    assert!(session.diagram().table(orders).is_none());
    assert_eq!(session.diagram().association_count(), 0);
    Ok(())
}

#[test]
fn undo_everything_restores_empty_diagram() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    let empty = session.diagram().contents();
    let a = session.add_table("a", &["id"])?;
    let b = session.add_table("b", &[])?;
    session.connect(a, b)?;
    session.set_table_property(b, "name", PropertyValue::text("c"))?;
    session.remove_table(a)?;

    while session.undo()? {}
    assert_eq!(session.diagram().contents(), empty);
    Ok(())
}

// ============================================================================
// History limits and failures
// ============================================================================

#[test]
fn default_history_is_not_capped() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("t0", &[])?;
    for n in 1..=150 {
        session.set_table_property(id, "name", PropertyValue::text(format!("t{n}")))?;
    }
    assert_eq!(session.history().undo_depth(), 151);

    while session.undo()? {}
    assert!(session.diagram().table(id).is_none());
    Ok(())
}

#[test]
fn configured_depth_caps_history() -> Result<(), Box<dyn std::error::Error>> {
    let config = EditorConfig::default().with_undo_depth(3);
    let mut session = EditorSession::new(config);
    let id = session.add_table("t0", &[])?;
    for n in 1..=5 {
        session.set_table_property(id, "name", PropertyValue::text(format!("t{n}")))?;
    }
    assert_eq!(session.history().undo_depth(), 3);

    while session.undo()? {}
    assert_eq!(table_name(&session, id).as_deref(), Some("t2"));
    Ok(())
}

#[test]
fn replay_against_diverged_graph_fails() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &[])?;
    session.set_table_property(id, "name", PropertyValue::text("clients"))?;

    // Bypass the history so it no longer describes the graph.
    ElementStore::<Table>::remove(session.diagram_mut(), id).ok_or("missing table")?;

    let err = session.undo().unwrap_err();
    assert!(matches!(err, EngineError::ElementNotFound(missing) if missing == id));
    assert_eq!(session.history().undo_depth(), 1);
    assert!(!session.history().can_redo());
    assert!(!session.history().is_holding());
    Ok(())
}

#[test]
fn load_clears_history() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = EditorSession::new(EditorConfig::default());
    let id = session.add_table("orders", &[])?;
    session.set_table_property(id, "name", PropertyValue::text("clients"))?;
    session.undo()?;

    let mut replacement = Diagram::new();
    let loaded = Table::new("loaded");
    let loaded_id = erd_core::Element::id(&loaded);
    ElementStore::<Table>::insert(&mut replacement, loaded)?;

    let previous = session.load(replacement);
    assert_eq!(previous.table_count(), 1);
    assert!(!session.history().can_undo());
    assert!(!session.history().can_redo());

    // The recorder follows the new diagram.
    session.set_table_property(loaded_id, "name", PropertyValue::text("renamed"))?;
    assert_eq!(session.history().undo_depth(), 1);
    Ok(())
}
