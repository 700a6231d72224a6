use std::sync::{Arc, Mutex};

use dash_store::{
    ctrl_message, ChangeEvent, ChangeOrigin, ErrorKind, ManualClock, Mutation, RecordingSync, Store,
    SyncMessage,
};
use serde_json::json;

fn recorded(store: &mut Store) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    store.on_change(move |e: &ChangeEvent| sink.lock().unwrap().push(e.clone()));
    events
}

#[test]
fn inbound_frames_are_applied() {
    let mut s = Store::new();
    let frame = SyncMessage::from_wire(r#"{"topic": "boiler/temp", "payload": 71.5}"#).unwrap();
    assert_eq!(s.handle_message(frame).unwrap(), None);
    assert_eq!(s.get("boiler/temp"), Some(&json!(71.5)));

    let frame = SyncMessage::from_wire(r#"{"kind": "set", "topic": "boiler/temp", "payload": 72}"#)
        .unwrap();
    assert_eq!(s.handle_message(frame).unwrap(), Some(json!(71.5)));

    let frame = SyncMessage::from_wire(r#"{"kind": "unset", "topic": "boiler/temp"}"#).unwrap();
    assert_eq!(s.handle_message(frame).unwrap(), Some(json!(72)));
    assert_eq!(s.sd()["boiler"], json!({}));
}

#[test]
fn inbound_config_load_is_not_echoed() {
    let sync = RecordingSync::new();
    let mut s = Store::new().with_sync(sync.clone());
    let frame = SyncMessage::Set {
        topic: "$config".to_string(),
        payload: json!({"dash": {"title": "Plant", "tabs": []}, "widgets": {}}),
    };
    s.handle_message(frame).unwrap();
    assert_eq!(s.config()["dash"]["title"], json!("Plant"));
    assert!(sync.is_empty());
    assert!(s.undo_buffer().is_empty());
}

#[test]
fn outbound_messages_round_trip_through_the_wire_form() {
    let sync = RecordingSync::new();
    let mut s = Store::new().with_sync(sync.clone());
    s.init_dash().unwrap();
    s.add_widget("g00001", "Stat").unwrap();

    let mut mirror = Store::new();
    mirror.init_dash().unwrap();
    for message in sync.take() {
        let wire = message.to_wire().unwrap();
        mirror.handle_message(SyncMessage::from_wire(&wire).unwrap()).unwrap();
    }
    assert_eq!(mirror.config(), s.config());
}

#[test]
fn handshake_goes_out_on_ctrl() {
    let hello = ctrl_message(true, true);
    assert_eq!(hello.topic(), "$ctrl");
    assert_eq!(
        hello.to_wire().unwrap(),
        r#"{"kind":"set","topic":"$ctrl","payload":"start"}"#
    );
}

#[test]
fn listeners_see_local_and_remote_changes() {
    let mut s = Store::new().with_clock(ManualClock::default());
    let events = recorded(&mut s);

    s.insert_data("room/temp", Some(json!(20))).unwrap();
    s.q_mutation(
        Some("edit"),
        vec![
            Mutation::set("widgets//w1", json!({"id": "w1"})),
            Mutation::set("dash/title", json!("x")),
        ],
    )
    .unwrap();
    s.insert_data("$config", Some(json!({"conn": {}}))).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].origin, ChangeOrigin::Remote);
    assert_eq!(events[0].paths, ["sd/room/temp"]);
    assert_eq!(events[1].origin, ChangeOrigin::Local);
    assert_eq!(events[1].paths, ["$config/widgets/w1", "$config/dash/title"]);
    assert!(events[1].touches("$config/widgets"));
    assert!(!events[1].touches("sd"));
    assert_eq!(events[2].paths, ["$config/conn"]);
}

#[test]
fn failed_writes_are_not_announced() {
    let mut s = Store::new();
    let events = recorded(&mut s);
    s.insert_data("", Some(json!(1))).unwrap_err();
    s.q_mutation(
        Some("bad"),
        vec![
            Mutation::set("dash", json!({"tabs": ["t1"]})),
            Mutation::delete("dash/tabs/0"),
        ],
    )
    .unwrap_err();
    assert_eq!(s.config(), &json!({}));
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn removed_listeners_stop_receiving() {
    let mut s = Store::new();
    let events = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&events);
    let id = s.on_change(move |_: &ChangeEvent| *sink.lock().unwrap() += 1);

    s.insert_data("a", Some(json!(1))).unwrap();
    assert!(s.off_change(id));
    assert!(!s.off_change(id));
    s.insert_data("a", Some(json!(2))).unwrap();
    assert_eq!(*events.lock().unwrap(), 1);
}

#[test]
fn malformed_frames_are_invalid_payloads() {
    for text in ["[1, 2]", "{\"kind\": \"set\"}", "not json"] {
        let err = SyncMessage::from_wire(text).expect_err("not a frame");
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }
}
