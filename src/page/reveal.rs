//! Entry animations: sections fade up as they scroll into view, KPI cards
//! pop in when their grid appears, and the hero's floating cards pop in on
//! load. Each element starts hidden and reaches its natural look through a
//! CSS transition.

pub const SECTION_SELECTOR: &str = ".section-header, .about-card, .skill-card, .project-card, .cert-item";
pub const KPI_GRID_SELECTOR: &str = ".kpi-grid";
pub const KPI_CARD_SELECTOR: &str = ".kpi-card";
pub const FLOATING_CARD_SELECTOR: &str = ".floating-card";

// Overshooting curve standing in for a spring.
const SPRING: &str = "cubic-bezier(0.34, 1.56, 0.64, 1)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    /// Transform applied while hidden; the visible state has none.
    pub hidden_transform: &'static str,
    pub duration_s: f64,
    pub easing: &'static str,
    /// Delay between consecutive elements of one group.
    pub stagger_s: f64,
    /// Delay before the first element of a group.
    pub start_s: f64,
}

pub const FADE_UP: Reveal = Reveal {
    hidden_transform: "translateY(50px)",
    duration_s: 0.6,
    easing: "ease-out",
    stagger_s: 0.0,
    start_s: 0.0,
};

pub const KPI_POP: Reveal = Reveal {
    hidden_transform: "scale(0.8)",
    duration_s: 0.6,
    easing: SPRING,
    stagger_s: 0.1,
    start_s: 0.0,
};

pub const CARD_POP: Reveal = Reveal {
    hidden_transform: "scale(0.5)",
    duration_s: 0.5,
    easing: SPRING,
    stagger_s: 0.1,
    start_s: 1.5,
};

impl Reveal {
    /// Delay of the `index`-th element of a group, in seconds.
    pub fn delay(&self, index: usize) -> f64 {
        self.start_s + index as f64 * self.stagger_s
    }

    /// CSS `transition` value for the `index`-th element of a group.
    pub fn transition(&self, index: usize) -> String {
        let (duration, easing, delay) = (self.duration_s, self.easing, self.delay(index));
        format!("opacity {duration:.2}s {easing} {delay:.2}s, transform {duration:.2}s {easing} {delay:.2}s")
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::{hide, install, show};

#[cfg(target_arch = "wasm32")]
mod dom {
    use js_sys::Array;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Element, HtmlElement, IntersectionObserver, IntersectionObserverEntry};

    use super::*;
    use crate::page::{elements, query_all};

    fn set_styles(element: &Element, styles: &[(&str, &str)]) {
        let Some(element) = element.dyn_ref::<HtmlElement>() else { return };
        let style = element.style();
        for (name, value) in styles {
            if let Err(e) = style.set_property(name, value) {
                log::warn!("Failed to set {}: {:?}", name, e);
            }
        }
    }

    pub fn hide(element: &Element, reveal: &Reveal) {
        set_styles(element, &[("opacity", "0"), ("transform", reveal.hidden_transform)]);
    }

    /// Starts the transition from the hidden state to the natural look.
    pub fn show(element: &Element, reveal: &Reveal, index: usize) {
        // flush the hidden state so the browser has something to transition from
        if let Some(html) = element.dyn_ref::<HtmlElement>() {
            html.offset_width();
        }
        set_styles(
            element,
            &[("transition", &reveal.transition(index)), ("opacity", "1"), ("transform", "none")],
        );
    }

    /// Calls `on_enter` the first time each target becomes visible.
    fn on_first_sight(targets: &[Element], on_enter: impl Fn(&Element) + 'static) -> Result<(), JsValue> {
        if targets.is_empty() {
            return Ok(());
        }
        let callback = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else { continue };
                    if entry.is_intersecting() {
                        let target = entry.target();
                        observer.unobserve(&target);
                        on_enter(&target);
                    }
                }
            },
        );
        let observer = IntersectionObserver::new(callback.as_ref().unchecked_ref())?;
        for target in targets {
            observer.observe(target);
        }
        callback.forget();
        Ok(())
    }

    pub fn install(document: &web_sys::Document) -> Result<(), JsValue> {
        let sections = query_all(document, SECTION_SELECTOR)?;
        for section in &sections {
            hide(section, &FADE_UP);
        }
        on_first_sight(&sections, |section| show(section, &FADE_UP, 0))?;

        let grids = query_all(document, KPI_GRID_SELECTOR)?;
        for grid in &grids {
            for card in elements(grid.query_selector_all(KPI_CARD_SELECTOR)?) {
                hide(&card, &KPI_POP);
            }
        }
        on_first_sight(&grids, |grid| match grid.query_selector_all(KPI_CARD_SELECTOR) {
            Ok(cards) => {
                for (i, card) in elements(cards).iter().enumerate() {
                    show(card, &KPI_POP, i);
                }
            }
            Err(e) => log::warn!("Failed to list KPI cards: {:?}", e),
        })?;

        let cards = query_all(document, FLOATING_CARD_SELECTOR)?;
        for card in &cards {
            hide(card, &CARD_POP);
        }
        for (i, card) in cards.iter().enumerate() {
            show(card, &CARD_POP, i);
        }

        log::debug!(
            "Reveal wired for {} sections, {} KPI grids, {} floating cards.",
            sections.len(),
            grids.len(),
            cards.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_cards_stagger_after_a_start_delay() {
        assert_eq!(CARD_POP.delay(0), 1.5);
        assert!((CARD_POP.delay(3) - 1.8).abs() < 1e-9);
    }

    #[test]
    fn transition_covers_opacity_and_transform() {
        assert_eq!(
            FADE_UP.transition(0),
            "opacity 0.60s ease-out 0.00s, transform 0.60s ease-out 0.00s"
        );
        assert!(KPI_POP.transition(2).contains("0.60s cubic-bezier(0.34, 1.56, 0.64, 1) 0.20s"));
    }

    #[test]
    fn sections_are_not_staggered() {
        assert_eq!(FADE_UP.delay(7), 0.0);
    }
}
