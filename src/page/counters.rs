/// Larger is slower.
const SPEED: f64 = 200.0;
pub const TICK_MS: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CounterTick {
    /// Show this value and tick again.
    Continue(f64),
    /// Show the exact target and stop.
    Done(f64),
}

/// One tick of a KPI count-up from the currently displayed value.
pub fn next_count(count: f64, target: f64) -> CounterTick {
    if count < target {
        CounterTick::Continue((count + target / SPEED * 2.0).ceil())
    } else {
        CounterTick::Done(target)
    }
}

/// Displayed values from `0` until the counter settles, inclusive.
pub fn count_sequence(target: f64) -> Vec<f64> {
    let mut shown = Vec::new();
    let mut count = 0.0;
    loop {
        match next_count(count, target) {
            CounterTick::Continue(next) => {
                shown.push(next);
                count = next;
            }
            CounterTick::Done(last) => {
                shown.push(last);
                return shown;
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub(super) fn install(window: &web_sys::Window, document: &web_sys::Document) -> Result<(), wasm_bindgen::JsValue> {
    use js_sys::Array;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen::closure::Closure;
    use web_sys::{IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit};

    let Some(hero) = document.get_element_by_id("hero") else { return Ok(()) };
    let counters = super::query_all(document, ".kpi-value")?;
    if counters.is_empty() {
        return Ok(());
    }

    let timer_window = window.clone();
    let on_visible = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
        move |entries: Array, observer: IntersectionObserver| {
            for entry in entries.iter() {
                let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else { continue };
                if !entry.is_intersecting() {
                    continue;
                }
                observer.unobserve(&entry.target());
                start_counting(&timer_window, counters.clone());
            }
        },
    );

    let options = IntersectionObserverInit::new();
    options.set_threshold(&JsValue::from_f64(0.5));
    let observer = IntersectionObserver::new_with_options(on_visible.as_ref().unchecked_ref(), &options)?;
    observer.observe(&hero);
    on_visible.forget();
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn start_counting(window: &web_sys::Window, counters: Vec<web_sys::Element>) {
    use std::cell::Cell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;

    let interval = Rc::new(Cell::new(None::<i32>));
    let interval_handle = interval.clone();
    let clear_window = window.clone();
    let tick = Closure::<dyn FnMut()>::new(move || {
        let mut running = false;
        for counter in &counters {
            let target = counter
                .get_attribute("data-target")
                .and_then(|t| t.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            let count = counter
                .text_content()
                .and_then(|t| t.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            let shown = match next_count(count, target) {
                CounterTick::Continue(next) => {
                    running = true;
                    next
                }
                CounterTick::Done(last) => last,
            };
            counter.set_text_content(Some(&shown.to_string()));
        }
        if !running {
            if let Some(id) = interval_handle.take() {
                clear_window.clear_interval_with_handle(id);
            }
        }
    });
    match window.set_interval_with_callback_and_timeout_and_arguments_0(tick.as_ref().unchecked_ref(), TICK_MS) {
        Ok(id) => interval.set(Some(id)),
        Err(e) => log::warn!("Failed to start KPI counters: {:?}", e),
    }
    tick.forget();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_up_in_hundredths_of_the_target() {
        let shown = count_sequence(100.0);
        assert_eq!(shown.len(), 101);
        assert_eq!(shown[0], 1.0);
        assert_eq!(shown[99], 100.0);
        assert_eq!(*shown.last().unwrap(), 100.0);
    }

    #[test]
    fn small_targets_step_by_one() {
        let shown = count_sequence(15.0);
        // step is 0.15, ceil makes every tick at least +1
        assert_eq!(&shown[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(*shown.last().unwrap(), 15.0);
    }

    #[test]
    fn overshoot_is_snapped_back_to_target() {
        let shown = count_sequence(250.0);
        assert_eq!(shown[0], 3.0);
        assert_eq!(shown[shown.len() - 2], 252.0);
        assert_eq!(*shown.last().unwrap(), 250.0);
    }

    #[test]
    fn zero_target_settles_immediately() {
        assert_eq!(next_count(0.0, 0.0), CounterTick::Done(0.0));
        assert_eq!(count_sequence(0.0), vec![0.0]);
    }
}
