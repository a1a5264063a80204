//! Controller behavior against an in-memory document
//!
//! All tests run on a paused clock so debounce and timer behavior is
//! deterministic.

use async_trait::async_trait;
use idlabel_annotate::markers::PAGE_ATTR;
use idlabel_core::{
    Identifier, Label, LabelMap, LabelStore, MemoryLabelStore, StoreError, StoreResult,
};
use idlabel_dom::{ArenaDocument, DocumentTree, Location, NodeId};
use idlabel_engine::{
    Controller, ControllerState, EngineConfig, EngineError, HistoryEvents, SharedDocument, Trigger,
};
use idlabel_test_utils::{
    console_document, count_spans, home_location, sample_mapping, service_location, ConsoleNodes,
    PROD_ID,
};
use mockall::{mock, Sequence};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::sleep;

mock! {
    pub Store {}

    #[async_trait]
    impl LabelStore for Store {
        async fn get_all(&self) -> StoreResult<LabelMap>;
        async fn set(&self, id: Identifier, label: Label) -> StoreResult<()>;
        async fn remove(&self, id: &Identifier) -> StoreResult<()>;
        async fn clear(&self) -> StoreResult<()>;
        fn subscribe(&self) -> StoreResult<broadcast::Receiver<LabelMap>>;
        async fn export_all(&self) -> StoreResult<String>;
        async fn import_all(&self, serialized: &str) -> StoreResult<()>;
    }
}

fn setup(location: Location) -> (SharedDocument<ArenaDocument>, ConsoleNodes) {
    let (doc, nodes) = console_document(location);
    (Arc::new(Mutex::new(doc)), nodes)
}

fn controller(
    document: &SharedDocument<ArenaDocument>,
    store: Arc<dyn LabelStore>,
) -> Controller<ArenaDocument> {
    Controller::new(Arc::clone(document), store, EngineConfig::default()).unwrap()
}

fn text_of(document: &SharedDocument<ArenaDocument>, node: NodeId) -> String {
    document.lock().text_content(node)
}

fn spans_under(document: &SharedDocument<ArenaDocument>, node: NodeId) -> usize {
    count_spans(&*document.lock(), node)
}

#[tokio::test(start_paused = true)]
async fn start_runs_initial_pass_and_tags_page() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut controller = controller(&document, store);
    assert_eq!(controller.state(), ControllerState::Uninitialized);

    controller.start().await.unwrap();

    assert_eq!(controller.state(), ControllerState::Ready);
    assert!(controller.is_running());
    assert_eq!(text_of(&document, nodes.account), "Account: 1234-5678-9012 (Prod)");
    assert_eq!(text_of(&document, nodes.nav_label), "Admin @ 1234-5678-9012 (Prod)");
    assert_eq!(text_of(&document, nodes.code), "{\"Account\": \"123456789012\"}");
    {
        let doc = document.lock();
        assert_eq!(doc.attribute(doc.root(), PAGE_ATTR), Some("home"));
        assert_eq!(doc.title(), "Console Home | 123456789012 (Prod)");
    }
    let records = controller.pass_log().records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].triggers, vec![Trigger::Initial]);

    assert!(matches!(
        controller.start().await,
        Err(EngineError::AlreadyStarted)
    ));

    controller.stop().await;
    assert_eq!(controller.state(), ControllerState::Stopped);
    assert!(!controller.is_running());
}

#[tokio::test(start_paused = true)]
async fn burst_of_mutations_coalesces_into_one_pass() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut controller = controller(&document, store);
    controller.start().await.unwrap();
    let log = controller.pass_log();

    for _ in 0..3 {
        {
            let mut doc = document.lock();
            let p = doc.append_element(nodes.main, "p", &[]).unwrap();
            doc.append_text(p, "New 123456789012").unwrap();
        }
        sleep(Duration::from_millis(40)).await;
    }
    assert_eq!(log.len(), 1, "still inside the debounce window");

    sleep(Duration::from_millis(100)).await;
    assert_eq!(log.len(), 2);
    let pass = log.last().unwrap();
    assert_eq!(pass.triggers, vec![Trigger::Mutation]);
    assert_eq!(pass.report.rewritten, 3);
    assert_eq!(spans_under(&document, nodes.main), 5);
    assert_eq!(controller.state(), ControllerState::Idle);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(log.len(), 2, "own rewrites never retrigger");

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn mutations_without_identifiers_are_ignored() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut controller = controller(&document, store);
    controller.start().await.unwrap();

    {
        let mut doc = document.lock();
        let p = doc.append_element(nodes.main, "p", &[]).unwrap();
        doc.append_text(p, "nothing to see 12345").unwrap();
    }
    sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.pass_log().len(), 1);

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn mapping_change_clears_then_relabels() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let root = document.lock().root();
    let mut controller = controller(&document, Arc::clone(&store) as Arc<dyn LabelStore>);
    controller.start().await.unwrap();

    store
        .set(
            Identifier::parse(PROD_ID).unwrap(),
            Label::new("Production").unwrap(),
        )
        .await
        .unwrap();
    sleep(Duration::from_millis(200)).await;

    assert_eq!(
        text_of(&document, nodes.account),
        "Account: 1234-5678-9012 (Production)"
    );
    assert_eq!(
        text_of(&document, nodes.nav_label),
        "Admin @ 1234-5678-9012 (Production)"
    );
    assert_eq!(text_of(&document, nodes.dev_account), "Dev 210987654321 (Dev)");
    assert_eq!(spans_under(&document, root), 3);
    assert_eq!(
        document.lock().title(),
        "Console Home | 123456789012 (Production)"
    );

    let pass = controller.pass_log().last().unwrap();
    assert_eq!(pass.triggers, vec![Trigger::MappingChanged]);
    assert_eq!(pass.report.cleared, 3);

    store.clear().await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(spans_under(&document, root), 0);
    assert_eq!(text_of(&document, nodes.account), "Account: 1234-5678-9012");
    assert_eq!(document.lock().title(), "Console Home | 123456789012");
    assert_eq!(controller.state(), ControllerState::Ready);

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn mapping_change_keeps_labels_the_page_wrote() {
    let (document, _) = setup(home_location());
    document
        .lock()
        .set_title("Billing 123456789012 (Prod) report");
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut controller = controller(&document, Arc::clone(&store) as Arc<dyn LabelStore>);
    controller.start().await.unwrap();
    assert_eq!(document.lock().title(), "Billing 123456789012 (Prod) report");

    store
        .set(
            Identifier::parse(PROD_ID).unwrap(),
            Label::new("Production").unwrap(),
        )
        .await
        .unwrap();
    sleep(Duration::from_millis(200)).await;

    assert_eq!(
        document.lock().title(),
        "Billing 123456789012 (Production) (Prod) report"
    );

    store.clear().await.unwrap();
    sleep(Duration::from_millis(200)).await;
    assert_eq!(document.lock().title(), "Billing 123456789012 (Prod) report");

    controller.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn host_writes_between_passes_are_never_lost() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let config = EngineConfig::default()
        .with_debounce_ms(2)
        .with_safety_interval_ms(600_000);
    let mut controller = Controller::new(Arc::clone(&document), store, config).unwrap();
    controller.start().await.unwrap();

    let host = Arc::clone(&document);
    tokio::task::spawn_blocking(move || {
        for _ in 0..40 {
            {
                let mut doc = host.lock();
                let p = doc.append_element(nodes.main, "p", &[]).unwrap();
                doc.append_text(p, "Host 123456789012").unwrap();
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    })
    .await
    .unwrap();

    let mut labeled = 0;
    for _ in 0..100 {
        sleep(Duration::from_millis(20)).await;
        labeled = spans_under(&document, nodes.main);
        if labeled == 42 {
            break;
        }
    }
    assert_eq!(labeled, 42, "every host paragraph is labeled without the safety timer");

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn navigation_away_strips_page_labels_only() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let (handle, events) = HistoryEvents::channel();
    let mut controller = controller(&document, store).with_navigation_observer(Box::new(events));
    controller.start().await.unwrap();
    assert_eq!(spans_under(&document, nodes.main), 2);

    document.lock().set_location(service_location());
    assert!(handle.navigated(service_location()));
    sleep(Duration::from_millis(200)).await;

    assert_eq!(spans_under(&document, nodes.main), 0);
    assert_eq!(spans_under(&document, nodes.nav_button), 1);
    assert_eq!(text_of(&document, nodes.account), "Account: 1234-5678-9012");
    {
        let doc = document.lock();
        assert_eq!(doc.attribute(doc.root(), PAGE_ATTR), None);
    }
    let pass = controller.pass_log().last().unwrap();
    assert_eq!(pass.triggers, vec![Trigger::Navigation]);

    document.lock().set_location(home_location());
    handle.navigated(home_location());
    sleep(Duration::from_millis(200)).await;
    assert_eq!(spans_under(&document, nodes.main), 2);
    assert_eq!(spans_under(&document, nodes.nav_button), 1);

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn location_polling_is_the_fallback() {
    let (document, nodes) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut controller = controller(&document, store);
    controller.start().await.unwrap();

    document.lock().set_location(service_location());
    sleep(Duration::from_millis(500)).await;

    assert_eq!(spans_under(&document, nodes.main), 0);
    assert_eq!(spans_under(&document, nodes.nav_button), 1);
    assert_eq!(
        controller.pass_log().last().unwrap().triggers,
        vec![Trigger::Navigation]
    );

    controller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn safety_timer_rescans_only_with_labels() {
    let (document, _) = setup(home_location());
    let store = Arc::new(MemoryLabelStore::with_mapping(sample_mapping()));
    let mut labeled = controller(&document, store);
    labeled.start().await.unwrap();

    sleep(Duration::from_millis(3200)).await;
    let records = labeled.pass_log().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].triggers, vec![Trigger::SafetyTimer]);
    labeled.stop().await;

    let (document, _) = setup(home_location());
    let mut empty = controller(&document, Arc::new(MemoryLabelStore::new()));
    empty.start().await.unwrap();
    sleep(Duration::from_millis(3200)).await;
    assert_eq!(empty.pass_log().len(), 1);
    empty.stop().await;
}

#[tokio::test(start_paused = true)]
async fn failed_initialization_recovers_on_notification() {
    let (document, nodes) = setup(home_location());
    let (changes, _keep) = broadcast::channel(4);

    let mut store = MockStore::new();
    let mut seq = Sequence::new();
    let sender = changes.clone();
    store
        .expect_subscribe()
        .returning(move || Ok(sender.subscribe()));
    store
        .expect_get_all()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Err(StoreError::Unavailable("offline".into())));
    store
        .expect_get_all()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|| Ok(sample_mapping()));

    let mut controller = controller(&document, Arc::new(store));
    controller.start().await.unwrap();

    assert_eq!(controller.state(), ControllerState::Uninitialized);
    assert!(controller.pass_log().is_empty());
    assert_eq!(text_of(&document, nodes.account), "Account: 1234-5678-9012");

    changes.send(sample_mapping()).unwrap();
    sleep(Duration::from_millis(200)).await;

    assert_eq!(controller.state(), ControllerState::Ready);
    assert_eq!(text_of(&document, nodes.account), "Account: 1234-5678-9012 (Prod)");
    assert_eq!(controller.pass_log().len(), 1);

    controller.stop().await;
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let (document, _) = setup(home_location());
    let config = EngineConfig::default().with_debounce_ms(0);
    let result = Controller::new(document, Arc::new(MemoryLabelStore::new()), config);
    assert!(matches!(result, Err(EngineError::Config(_))));
}
