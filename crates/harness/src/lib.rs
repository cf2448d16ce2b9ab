pub mod diagram;
pub mod recorder;
pub mod session;

pub use diagram::{Association, Diagram, DiagramContents, Directionality, Table};
pub use recorder::UndoRecorder;
pub use session::EditorSession;

/// Route engine logs to the test writer. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_test_writer()
        .try_init();
}
