use std::{
    io::Read as _,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use base64::Engine as _;
use shelfgrid::{
    Adapter, DataUrl, GenerateCameraBody, Mode, OpenAiImageEdits, ShelfError, TimeoutPolicy,
};

struct Captured {
    url: String,
    authorization: Option<String>,
    body: Vec<u8>,
}

struct FakeDownstream {
    base_url: String,
    hits: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<Captured>>>,
}

fn fake_downstream(status: u16, body: String) -> FakeDownstream {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(Mutex::new(None));

    let (h, l) = (hits.clone(), last.clone());
    std::thread::spawn(move || {
        for mut req in server.incoming_requests() {
            let mut buf = Vec::new();
            let _ = req.as_reader().read_to_end(&mut buf);
            let authorization = req
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.as_str().to_string());
            *l.lock().unwrap() = Some(Captured {
                url: req.url().to_string(),
                authorization,
                body: buf,
            });
            h.fetch_add(1, Ordering::SeqCst);
            let resp = tiny_http::Response::from_string(body.clone()).with_status_code(status);
            let _ = req.respond(resp);
        }
    });

    FakeDownstream {
        base_url: format!("http://{addr}"),
        hits,
        last,
    }
}

fn adapter_for(fake: &FakeDownstream) -> Adapter {
    let capability = OpenAiImageEdits::new(&fake.base_url, "sk-test", "gpt-image-1", None).unwrap();
    Adapter::with_capability(capability, TimeoutPolicy::Fail)
}

fn body() -> GenerateCameraBody {
    GenerateCameraBody {
        background_data_url: Some(DataUrl::png(vec![0x89, b'P', b'N', b'G']).to_string()),
        camera_name: Some("Hasselblad 500C/M (1970)".into()),
        orientation: Some("right".into()),
        material: Some("walnut".into()),
        cell_width: Some(1500),
        cell_height: Some(600),
    }
}

#[test]
fn offline_fallback_is_deterministic() {
    let adapter = Adapter::offline();
    let a = adapter.handle_body(body()).unwrap();
    let b = adapter.handle_body(body()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.mode, Mode::Fallback);
    assert_eq!(a.image.mime(), "image/svg+xml");

    let svg = String::from_utf8(a.image.into_bytes()).unwrap();
    assert!(svg.contains("width=\"1500\" height=\"600\""));
    assert!(svg.contains("Hasselblad 500C/M (1970)"));
    assert!(svg.contains("RIGHT VIEW \u{2022} walnut"));
}

#[test]
fn missing_camera_name_never_reaches_downstream() {
    let fake = fake_downstream(200, "{}".into());
    let adapter = adapter_for(&fake);

    let mut b = body();
    b.camera_name = None;
    let err = adapter.handle_body(b).unwrap_err();
    assert!(matches!(err, ShelfError::Validation(_)));
    assert_eq!(fake.hits.load(Ordering::SeqCst), 0);
}

#[test]
fn downstream_failure_is_a_single_call() {
    let fake = fake_downstream(500, r#"{"error":{"message":"boom"}}"#.into());
    let adapter = adapter_for(&fake);

    let err = adapter.handle_body(body()).unwrap_err();
    match &err {
        ShelfError::Generation(msg) => assert!(msg.contains("500"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fake.hits.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_payload_is_a_generation_error() {
    let fake = fake_downstream(200, r#"{"data":[]}"#.into());
    let err = adapter_for(&fake).handle_body(body()).unwrap_err();
    assert!(matches!(err, ShelfError::Generation(_)));
}

#[test]
fn successful_edit_is_generated_mode() {
    let png = b"\x89PNG fake bytes".to_vec();
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    let fake = fake_downstream(200, format!(r#"{{"data":[{{"b64_json":"{b64}"}}]}}"#));

    let res = adapter_for(&fake).handle_body(body()).unwrap();
    assert_eq!(res.mode, Mode::Generated);
    assert_eq!(res.image.mime(), "image/png");
    assert_eq!(res.image.bytes(), png.as_slice());

    let captured = fake.last.lock().unwrap().take().unwrap();
    assert_eq!(captured.url, "/v1/images/edits");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer sk-test"));

    let form = String::from_utf8_lossy(&captured.body);
    assert!(form.contains("name=\"model\""));
    assert!(form.contains("gpt-image-1"));
    assert!(form.contains("1024x600"));
    assert!(form.contains("filename=\"cell-background.png\""));
    assert!(form.contains("Camera model: Hasselblad 500C/M (1970)."));
}

#[test]
fn slow_downstream_follows_timeout_policy() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    std::thread::spawn(move || {
        for req in server.incoming_requests() {
            std::thread::sleep(std::time::Duration::from_millis(1500));
            let _ = req.respond(tiny_http::Response::from_string("{}"));
        }
    });
    let base = format!("http://{addr}");
    let timeout = Some(std::time::Duration::from_millis(200));

    let failing = Adapter::with_capability(
        OpenAiImageEdits::new(&base, "k", "gpt-image-1", timeout).unwrap(),
        TimeoutPolicy::Fail,
    );
    assert!(matches!(
        failing.handle_body(body()),
        Err(ShelfError::Timeout(_))
    ));

    let lenient = Adapter::with_capability(
        OpenAiImageEdits::new(&base, "k", "gpt-image-1", timeout).unwrap(),
        TimeoutPolicy::Fallback,
    );
    assert_eq!(lenient.handle_body(body()).unwrap().mode, Mode::Fallback);
}
