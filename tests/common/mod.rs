use std::sync::Once;

static INIT: Once = Once::new();

pub fn init() {
    INIT.call_once(|| {
        tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().init();
    });
}
