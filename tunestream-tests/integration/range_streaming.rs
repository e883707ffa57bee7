//! Range requests against an in-memory library

use axum::http::{StatusCode, header};
use proptest::prelude::*;

use crate::common::*;

#[tokio::test]
async fn test_full_content_without_range() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(128);
    fixture.add("song", data.clone()).await;

    let response = send(fixture.router(), stream_request("song", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("audio/mpeg"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("1000"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(header_str(&response, header::CONTENT_RANGE), None);
    assert_eq!(body_bytes(response).await, data);
}

#[tokio::test]
async fn test_partial_content_bounded_range() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    let response = send(fixture.router(), stream_request("song", Some("bytes=0-499"))).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 0-499/1000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("500"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(body_bytes(response).await, &data[..500]);
}

#[tokio::test]
async fn test_open_ended_range_runs_to_last_byte() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    let response = send(fixture.router(), stream_request("song", Some("bytes=500-"))).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 500-999/1000")
    );
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("500"));
    assert_eq!(body_bytes(response).await, &data[500..]);
}

#[tokio::test]
async fn test_single_byte_ranges() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    let last = send(fixture.router(), stream_request("song", Some("bytes=999-999"))).await;
    assert_eq!(last.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&last, header::CONTENT_RANGE),
        Some("bytes 999-999/1000")
    );
    assert_eq!(body_bytes(last).await, &data[999..]);

    let first = send(fixture.router(), stream_request("song", Some("bytes=0-0"))).await;
    assert_eq!(header_str(&first, header::CONTENT_LENGTH), Some("1"));
    assert_eq!(body_bytes(first).await, &data[..1]);
}

#[tokio::test]
async fn test_end_past_resource_is_clamped() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    let response = send(fixture.router(), stream_request("song", Some("bytes=900-5000"))).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 900-999/1000")
    );
    assert_eq!(body_bytes(response).await, &data[900..]);
}

#[tokio::test]
async fn test_unsatisfiable_start() {
    let fixture = Fixture::new(64);
    fixture.add("song", sample_bytes(1000)).await;

    let response = send(fixture.router(), stream_request("song", Some("bytes=1000-"))).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes */1000")
    );
}

#[tokio::test]
async fn test_reversed_range_is_unsatisfiable() {
    let fixture = Fixture::new(64);
    fixture.add("song", sample_bytes(1000)).await;

    let response = send(fixture.router(), stream_request("song", Some("bytes=600-100"))).await;
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn test_malformed_ranges_fall_back_to_full_content() {
    let data = sample_bytes(300);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    for header_value in ["bytes=abc", "items=0-10", "bytes=-100", "bytes=", "0-10"] {
        let response = send(fixture.router(), stream_request("song", Some(header_value))).await;

        assert_eq!(response.status(), StatusCode::OK, "header {header_value}");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("300"));
        assert_eq!(body_bytes(response).await, data, "header {header_value}");
    }
}

#[tokio::test]
async fn test_multiple_ranges_use_first() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(64);
    fixture.add("song", data.clone()).await;

    let response = send(
        fixture.router(),
        stream_request("song", Some("bytes=10-19, 100-199")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        header_str(&response, header::CONTENT_RANGE),
        Some("bytes 10-19/1000")
    );
    assert_eq!(body_bytes(response).await, &data[10..20]);
}

#[tokio::test]
async fn test_empty_resource_streams_empty_body() {
    let fixture = Fixture::new(64);
    fixture.add("silence", Vec::new()).await;

    let response = send(fixture.router(), stream_request("silence", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("0"));
    assert!(body_bytes(response).await.is_empty());

    let ranged = send(fixture.router(), stream_request("silence", Some("bytes=0-"))).await;
    assert_eq!(ranged.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&ranged, header::CONTENT_RANGE), Some("bytes */0"));
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(100);
    fixture.add("song", data).await;

    let first = body_bytes(send(fixture.router(), stream_request("song", Some("bytes=250-749"))).await).await;
    let second = body_bytes(send(fixture.router(), stream_request("song", Some("bytes=250-749"))).await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_consecutive_ranges_reassemble_resource() {
    let data = sample_bytes(1000);
    let fixture = Fixture::new(37);
    fixture.add("song", data.clone()).await;

    let mut reassembled = Vec::new();
    for (start, end) in [(0, 299), (300, 599), (600, 999)] {
        let range = format!("bytes={start}-{end}");
        let response = send(fixture.router(), stream_request("song", Some(&range))).await;
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        reassembled.extend(body_bytes(response).await);
    }
    assert_eq!(reassembled, data);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_partial_body_matches_slice(
        total in 1usize..2048,
        start_frac in 0.0f64..1.0,
        len in 1usize..512,
        chunk_size in 1usize..300,
    ) {
        let start = ((total as f64) * start_frac) as usize;
        let start = start.min(total - 1);
        let end = start + len - 1;
        let data = sample_bytes(total);
        let expected_end = end.min(total - 1);

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (status, content_range, body) = runtime.block_on(async {
            let fixture = Fixture::new(chunk_size);
            fixture.add("song", data.clone()).await;
            let range = format!("bytes={start}-{end}");
            let response = send(fixture.router(), stream_request("song", Some(&range))).await;
            let status = response.status();
            let content_range = header_str(&response, header::CONTENT_RANGE).map(str::to_owned);
            (status, content_range, body_bytes(response).await)
        });

        prop_assert_eq!(status, StatusCode::PARTIAL_CONTENT);
        prop_assert_eq!(
            content_range,
            Some(format!("bytes {start}-{expected_end}/{total}"))
        );
        prop_assert_eq!(body, data[start..=expected_end].to_vec());
    }
}
