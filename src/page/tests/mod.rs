use super::*;
use crate::types::{Card, Embed, Gallery, Quote};
use extract::{extract_records, last_item_id};
use chrono::DateTime;
use serde_json::json;

/// Wrap an item body in the container markup used by feed pages
fn item(id: &str, body: &str) -> String {
    format!(
        r#"<li class="js-stream-item stream-item" data-item-id="{id}" data-item-type="tweet">
  <div class="tweet js-stream-tweet" data-tweet-id="{id}">{body}</div>
</li>"#
    )
}

/// A plain item with a timestamp and text
fn plain_item(id: u64, time: i64, text: &str) -> String {
    item(
        &id.to_string(),
        &format!(
            r#"<small class="time"><span class="_timestamp" data-time="{time}">Jun 9</span></small>
<p class="TweetTextSize js-tweet-text tweet-text" lang="en">{text}</p>"#
        ),
    )
}

fn stream(items: &[String]) -> String {
    format!(
        r#"<ol class="stream-items" id="stream-items-id">{}</ol>"#,
        items.join("\n")
    )
}

#[test]
fn test_extract_well_formed_page() {
    let items: Vec<String> = (0..20)
        .map(|i| plain_item(608164787940413460 - i, 1433866186 - i as i64, "text"))
        .collect();

    let records = extract_records(&stream(&items)).unwrap();

    assert_eq!(records.len(), 20, "Extraction returned unexpected number of records");
    assert_eq!(records[0].id, 608164787940413460);
    assert_eq!(records[19].id, 608164787940413441);
}

#[test]
fn test_extract_record_fields() {
    let html = stream(&[item(
        "506859703859965952",
        r#"<span data-time="1409911893">Sep 5</span>
<p class="tweet-text">Hello <a href="/world" class="twitter-atreply">@<b>world</b></a>!</p>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, 506859703859965952);
    assert_eq!(record.timestamp, DateTime::from_timestamp(1409911893, 0));
    assert_eq!(record.text, "Hello @world!");
    assert_eq!(record.embed, None);
}

#[test]
fn test_missing_timestamp_is_not_an_error() {
    let html = stream(&[item("1", r#"<p class="tweet-text">no time</p>"#)]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp, None);
}

#[test]
fn test_empty_text_is_valid() {
    let html = stream(&[item("1", r#"<p class="tweet-text"></p>"#)]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "");
}

#[test]
fn test_empty_fragment_yields_no_records() {
    assert!(extract_records("").unwrap().is_empty());
    assert!(extract_records("<div>no items here</div>").unwrap().is_empty());
}

#[test]
fn test_non_item_containers_are_ignored() {
    let html = stream(&[
        r#"<li data-item-type="user" data-item-id="99"><p class="tweet-text">user</p></li>"#
            .to_string(),
        plain_item(5, 1, "kept"),
    ]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 5);
}

#[test]
fn test_unparsable_id_truncates_page() {
    let html = stream(&[
        plain_item(3, 1, "first"),
        plain_item(2, 1, "second"),
        item("not-a-number", r#"<p class="tweet-text">bad</p>"#),
        plain_item(1, 1, "never seen"),
    ]);

    let records = extract_records(&html).unwrap();

    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 2], "Records after the bad item must be dropped");
}

#[test]
fn test_missing_text_truncates_page() {
    let html = stream(&[
        plain_item(3, 1, "first"),
        item("2", r#"<span data-time="1">t</span>"#),
        plain_item(1, 1, "never seen"),
    ]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 3);
}

#[test]
fn test_multiple_text_nodes_truncate_page() {
    let html = stream(&[item(
        "2",
        r#"<p class="tweet-text">one</p><p class="tweet-text">two</p>"#,
    )]);

    assert!(extract_records(&html).unwrap().is_empty());
}

#[test]
fn test_multiple_timestamps_truncate_page() {
    let html = stream(&[
        plain_item(3, 1, "first"),
        item(
            "2",
            r#"<span data-time="1">a</span><span data-time="2">b</span><p class="tweet-text">x</p>"#,
        ),
    ]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 3);
}

#[test]
fn test_unparsable_timestamp_truncates_page() {
    let html = stream(&[item(
        "2",
        r#"<span data-time="yesterday">a</span><p class="tweet-text">x</p>"#,
    )]);

    assert!(extract_records(&html).unwrap().is_empty());
}

#[test]
fn test_gallery_collects_images_in_order() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">pics</p>
<div class="AdaptiveMedia-photoContainer" data-image-url="https://pbs.twimg.com/media/a.jpg"></div>
<div class="AdaptiveMedia-photoContainer" data-image-url="https://pbs.twimg.com/media/b.png"></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(
        records[0].embed,
        Some(Embed::Gallery(Gallery {
            image_urls: vec![
                "https://pbs.twimg.com/media/a.jpg".to_string(),
                "https://pbs.twimg.com/media/b.png".to_string(),
            ],
        }))
    );
}

#[test]
fn test_gallery_takes_precedence_over_card() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">both</p>
<div class="card2" data-card-url="https://t.co/card"></div>
<div data-image-url="https://pbs.twimg.com/media/a.jpg"></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert!(
        matches!(&records[0].embed, Some(Embed::Gallery(_))),
        "Gallery must win over card, got {:?}",
        records[0].embed
    );
}

#[test]
fn test_gallery_skips_card_cardinality_check() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">both</p>
<div data-card-url="https://t.co/one"></div>
<div data-card-url="https://t.co/two"></div>
<div data-image-url="https://pbs.twimg.com/media/a.jpg"></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1, "Later checks must not run once a gallery matched");
    assert!(matches!(&records[0].embed, Some(Embed::Gallery(_))));
}

#[test]
fn test_card_takes_precedence_over_quote() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">card</p>
<div class="card2" data-card-url="https://t.co/card"></div>
<div class="QuoteTweet-link" href="/someone/status/1"></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(
        records[0].embed,
        Some(Embed::Card(Card {
            card_url: "https://t.co/card".to_string(),
        }))
    );
}

#[test]
fn test_multiple_cards_truncate_page() {
    let html = stream(&[
        plain_item(11, 1, "kept"),
        item(
            "10",
            r#"<p class="tweet-text">cards</p>
<div data-card-url="https://t.co/one"></div>
<div data-card-url="https://t.co/two"></div>"#,
        ),
    ]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 11);
}

#[test]
fn test_quote_url_is_absolute() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">quoting</p>
<div class="QuoteTweet-link js-nav" href="/someone/status/386615604008194048"></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(
        records[0].embed,
        Some(Embed::Quote(Quote {
            quote_url: "https://twitter.com/someone/status/386615604008194048".to_string(),
        }))
    );
}

#[test]
fn test_quote_without_href_truncates_page() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">quoting</p><div class="QuoteTweet-link"></div>"#,
    )]);

    assert!(extract_records(&html).unwrap().is_empty());
}

#[test]
fn test_multiple_quotes_truncate_page() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">quoting</p>
<div class="QuoteTweet-link" href="/a/status/1"></div>
<div class="QuoteTweet-link" href="/b/status/2"></div>"#,
    )]);

    assert!(extract_records(&html).unwrap().is_empty());
}

#[test]
fn test_video_is_detected_without_variant() {
    let html = stream(&[item(
        "10",
        r#"<p class="tweet-text">watch</p>
<div class="PlayableMedia PlayableMedia--video"><div class="PlayableMedia-player"></div></div>"#,
    )]);

    let records = extract_records(&html).unwrap();

    assert_eq!(records.len(), 1, "Video items are kept");
    assert_eq!(records[0].embed, None);
}

#[test]
fn test_last_item_id() {
    let html = stream(&[plain_item(3, 1, "a"), plain_item(2, 1, "b")]);
    assert_eq!(last_item_id(&html).unwrap(), Some("2".to_string()));

    assert_eq!(last_item_id("").unwrap(), None);
}

#[test]
fn test_last_item_id_requires_attribute() {
    let html = r#"<li data-item-type="tweet"><p class="tweet-text">x</p></li>"#;
    assert!(last_item_id(html).is_err());
}

#[test]
fn test_from_payload_uses_min_position() {
    let payload = json!({
        "min_position": "608164787940413441",
        "has_more_items": true,
        "items_html": stream(&[plain_item(608164787940413450, 1, "a")]),
        "new_latent_count": 20,
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.records().len(), 1);
    assert_eq!(page.next_position(), Some("608164787940413441"));
}

#[test]
fn test_from_payload_null_min_position_ends_feed() {
    let payload = json!({
        "min_position": null,
        "items_html": stream(&[plain_item(5, 1, "a")]),
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.records().len(), 1);
    assert_eq!(page.next_position(), None);
}

#[test]
fn test_from_payload_empty_min_position_ends_feed() {
    let payload = json!({
        "min_position": "",
        "items_html": stream(&[plain_item(5, 1, "a")]),
    });

    assert_eq!(FeedPage::from_payload(&payload).unwrap().next_position(), None);
}

#[test]
fn test_from_payload_missing_min_position_falls_back_to_last_item() {
    let payload = json!({
        "items_html": stream(&[
            plain_item(506859703859965960, 1, "a"),
            plain_item(506859703859965952, 1, "b"),
        ]),
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.next_position(), Some("506859703859965952"));
}

#[test]
fn test_fallback_position_ignores_truncation() {
    // The position comes from the markup, not from the extracted records.
    let payload = json!({
        "items_html": stream(&[
            plain_item(30, 1, "a"),
            item("20", r#"<span>no text node</span>"#),
            plain_item(10, 1, "c"),
        ]),
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.records().len(), 1);
    assert_eq!(page.next_position(), Some("10"));
}

#[test]
fn test_from_payload_missing_min_position_without_items() {
    let payload = json!({"items_html": ""});

    let page = FeedPage::from_payload(&payload).unwrap();

    assert!(page.records().is_empty());
    assert_eq!(page.next_position(), None);
}

#[test]
fn test_non_string_min_position_keeps_records() {
    let payload = json!({
        "min_position": 608164787940413441u64,
        "items_html": stream(&[plain_item(3, 1, "a"), plain_item(2, 1, "b")]),
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.records().len(), 2);
    assert_eq!(page.next_position(), None);
    let err = page.position_error().unwrap();
    assert!(matches!(err, Error::Compat { .. }));
    assert!(err.to_string().contains("min_position"));
}

#[test]
fn test_fallback_without_item_id_keeps_records() {
    // The last container has no id: it cannot become a record nor a position.
    let payload = json!({
        "items_html": stream(&[
            plain_item(3, 1, "a"),
            r#"<li data-item-type="tweet"><p class="tweet-text">b</p></li>"#.to_string(),
        ]),
    });

    let page = FeedPage::from_payload(&payload).unwrap();

    assert_eq!(page.records().len(), 1);
    assert!(page.position_error().is_some());

    let (records, next_position) = page.into_parts();
    assert_eq!(records[0].id, 3);
    assert!(next_position.is_err());
}

#[test]
fn test_from_payload_requires_items_html() {
    let payload = json!({"min_position": "1"});
    assert!(matches!(
        FeedPage::from_payload(&payload),
        Err(Error::Compat { .. })
    ));
}

#[test]
fn test_from_payload_requires_object() {
    assert!(FeedPage::from_payload(&json!(["items_html"])).is_err());
    assert!(FeedPage::from_payload(&json!(null)).is_err());
}

#[test]
fn test_new_normalizes_empty_position() {
    let page = FeedPage::new(Vec::new(), Some(String::new()));
    assert_eq!(page.next_position(), None);
    assert!(page.position_error().is_none());
}

