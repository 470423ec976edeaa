#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement};

use neural_field::page;
use neural_field::page::theme::Theme;

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn append(document: &Document, tag: &str, id: &str, classes: &str) -> HtmlElement {
    let element = document.create_element(tag).unwrap();
    if !id.is_empty() {
        element.set_id(id);
    }
    element.set_class_name(classes);
    document.body().unwrap().append_child(&element).unwrap();
    element.dyn_into().unwrap()
}

#[wasm_bindgen_test]
fn page_behaviors_respond_to_clicks() {
    let document = document();
    let storage = web_sys::window().unwrap().local_storage().unwrap().unwrap();
    storage.set_item(Theme::STORAGE_KEY, "business").unwrap();

    let toggle = append(&document, "button", "theme-toggle", "");
    let data_btn = append(&document, "button", "", "track-btn active");
    data_btn.set_attribute("data-track", "data").unwrap();
    let biz_btn = append(&document, "button", "", "track-btn");
    biz_btn.set_attribute("data-track", "business").unwrap();
    let data_track = append(&document, "div", "track-data", "experience-track active");
    let biz_track = append(&document, "div", "track-business", "experience-track");

    page::install().unwrap();

    let html = document.document_element().unwrap();
    assert_eq!(html.get_attribute(Theme::ATTRIBUTE).as_deref(), Some("business"));
    toggle.click();
    assert_eq!(html.get_attribute(Theme::ATTRIBUTE).as_deref(), Some("data"));
    assert_eq!(storage.get_item(Theme::STORAGE_KEY).unwrap().as_deref(), Some("data"));

    biz_btn.click();
    assert!(biz_btn.class_list().contains("active"));
    assert!(!data_btn.class_list().contains("active"));
    assert!(biz_track.class_list().contains("active"));
    assert!(!data_track.class_list().contains("active"));
}

#[wasm_bindgen_test]
fn counter_logic_matches_in_the_browser() {
    let shown = page::counters::count_sequence(50.0);
    assert_eq!(shown.last().copied(), Some(50.0));
    assert!(shown.windows(2).all(|w| w[0] <= w[1]));
}

#[wasm_bindgen_test]
fn reveal_hides_sections_and_pops_floating_cards() {
    use page::reveal::{self, FADE_UP};

    let document = document();
    let section = append(&document, "div", "", "section-header");
    let card = append(&document, "div", "", "floating-card");

    reveal::install(&document).unwrap();

    let section_style = section.style();
    assert_eq!(section_style.get_property_value("opacity").unwrap(), "0");
    assert_eq!(section_style.get_property_value("transform").unwrap(), "translateY(50px)");

    // floating cards are scheduled straight away, behind their start delay
    let card_style = card.style();
    assert_eq!(card_style.get_property_value("opacity").unwrap(), "1");
    assert!(card_style.get_property_value("transition").unwrap().contains("1.5"));

    reveal::show(&section, &FADE_UP, 0);
    assert_eq!(section_style.get_property_value("opacity").unwrap(), "1");
    assert_eq!(section_style.get_property_value("transform").unwrap(), "none");
}
