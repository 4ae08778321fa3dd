#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // Whole-document and split-feed parsing must agree
    let whole = helios::markup::tabulate(&html);
    let mid = (html.len() / 2..=html.len())
        .find(|i| html.is_char_boundary(*i))
        .unwrap_or(html.len());
    let mut t = helios::markup::Tabulator::new();
    t.feed(&html[..mid]);
    t.feed(&html[mid..]);
    assert_eq!(t.finish(), whole);

    if let Ok(x) = helios::extract::FieldExtractor::new() {
        let _ = helios::reading::read_inverter_page(&html, &x);
    }
});
