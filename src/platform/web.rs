//! Browser host
//!
//! Applies `ViewCommand`s to the page and feeds DOM events back into the
//! controller. Expects the page's existing markup (overlays, HUD and the
//! `#game` playfield); styling and animation are pure CSS.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, PointerEvent};

use crate::config::RoundConfig;
use crate::persistence::LocalStore;
use crate::sim::{BubbleId, InputEvent, Outcome, RoundController, ViewCommand};

/// Host state shared by every callback
struct Game {
    controller: RoundController<LocalStore>,
    document: Document,
}

type Shared = Rc<RefCell<Game>>;

/// Boot the game: logging, controller, listeners, frame loop
pub fn run() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);

    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::error!("No document available");
        return;
    };

    let seed = js_sys::Date::now() as u64;
    let store = LocalStore::new();
    let config = RoundConfig::load(&store);
    let controller = match RoundController::new(config, store, seed) {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("Invalid round config: {}", e);
            return;
        }
    };
    let game = Rc::new(RefCell::new(Game {
        controller,
        document,
    }));
    log::info!("Bubble Pop starting (seed {})", seed);

    flush(&game);
    setup_buttons(&game);
    setup_pointer(&game);
    setup_animation_end(&game);
    setup_visibility(&game);
    request_animation_frame(game);
}

fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Feed one input event to the controller and apply the result
fn dispatch(game: &Shared, event: InputEvent) {
    game.borrow_mut().controller.handle(event, now());
    flush(game);
}

/// Apply queued commands; the borrow is released before DOM work
fn flush(game: &Shared) {
    let (commands, document) = {
        let mut g = game.borrow_mut();
        (g.controller.drain_commands(), g.document.clone())
    };
    for command in commands {
        apply(&document, command);
    }
}

fn request_animation_frame(game: Shared) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::once(move |time: f64| {
        game_loop(game, time);
    });
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn game_loop(game: Shared, time: f64) {
    {
        let mut g = game.borrow_mut();
        if let Some(el) = g.document.get_element_by_id("game") {
            g.controller.set_playfield_width(el.client_width() as f64);
        }
        g.controller.tick(time);
    }
    flush(&game);
    request_animation_frame(game);
}

fn apply(document: &Document, command: ViewCommand) {
    match command {
        ViewCommand::ShowCountdown { label, .. } => {
            set_visible(document, "startOverlay", false);
            set_visible(document, "endOverlay", false);
            set_visible(document, "countOverlay", true);
            set_text(document, "countNum", &label);
        }
        ViewCommand::HideCountdown => set_visible(document, "countOverlay", false),
        ViewCommand::SpawnBubble { id, size, x, rise_ms } => {
            spawn_bubble(document, id, size, x, rise_ms);
        }
        ViewCommand::MarkPopped(id) => {
            if let Some(el) = document.get_element_by_id(&dom_id(id)) {
                let _ = el.class_list().add_1("popped");
                if let Ok(el) = el.dyn_into::<HtmlElement>() {
                    let _ = el.style().set_property("pointer-events", "none");
                }
            }
        }
        ViewCommand::RemoveBubble(id) => {
            if let Some(el) = document.get_element_by_id(&dom_id(id)) {
                el.remove();
            }
        }
        ViewCommand::ClearBubbles => {
            let bubbles = document.get_elements_by_class_name("bubble");
            while let Some(el) = bubbles.item(0) {
                el.remove();
            }
        }
        ViewCommand::SetScore(score) => {
            set_text(document, "score", &score.to_string());
            set_text(document, "goalCount", &score.to_string());
        }
        ViewCommand::SetTimeLeft(secs) => set_text(document, "time", &secs.to_string()),
        ViewCommand::SetGoalTotal(goal) => set_text(document, "goalTotal", &goal.to_string()),
        ViewCommand::SetProgress(p) => {
            set_style(document, "goalFill", "transform", &format!("scaleX({})", p));
            set_style(document, "goalKnob", "left", &format!("{}%", p * 100.0));
        }
        ViewCommand::Haptic { duration_ms } => {
            if let Some(window) = web_sys::window() {
                let _ = window.navigator().vibrate_with_duration(duration_ms);
            }
        }
        ViewCommand::ShowEnd {
            final_score,
            best_score,
            outcome,
        } => {
            set_text(document, "finalScore", &final_score.to_string());
            set_text(document, "highscoreTxt", &format!("Best: {}", best_score));
            if let Some(title) = document.query_selector("#endOverlay h2").ok().flatten() {
                let text = match outcome {
                    Outcome::GoalMet => "Congratulations! You reached the goal! 🎉",
                    Outcome::TimeExpired => "Time's up! Try again...",
                };
                title.set_text_content(Some(text));
            }
            set_visible(document, "endOverlay", true);
        }
        ViewCommand::ShowBestHint(best) => show_best_hint(document, best),
    }
}

fn spawn_bubble(document: &Document, id: BubbleId, size: f64, x: f64, rise_ms: f64) {
    let Some(field) = document.get_element_by_id("game") else {
        return;
    };
    let Ok(el) = document.create_element("div") else {
        return;
    };
    el.set_id(&dom_id(id));
    el.set_class_name("bubble");
    let _ = el.set_attribute("role", "button");
    let _ = el.set_attribute("aria-label", "Bubble");
    let _ = el.set_attribute("data-gen", &id.generation.to_string());
    let _ = el.set_attribute("data-idx", &id.index.to_string());

    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let style = html.style();
        let _ = style.set_property("width", &format!("{}px", size));
        let _ = style.set_property("height", &format!("{}px", size));
        let _ = style.set_property("left", &format!("{}px", x));
        let _ = style.set_property("bottom", &format!("{}px", -size - 10.0));
        let _ = style.set_property("--rise", &format!("{}s", rise_ms / 1000.0));
    }

    let _ = field.append_child(&el);
}

fn setup_buttons(game: &Shared) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    for (button, event) in [("startBtn", InputEvent::Start), ("restartBtn", InputEvent::Restart)] {
        if let Some(btn) = document.get_element_by_id(button) {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                dispatch(&game, event);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

/// Delegated pointer-down on the playfield (multitouch friendly)
fn setup_pointer(game: &Shared) {
    let Some(field) = game.borrow().document.get_element_by_id("game") else {
        return;
    };
    let game = game.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
        event.prevent_default();
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if !target.class_list().contains("bubble") {
            return;
        }
        if let Some(id) = parse_bubble_id(&target) {
            dispatch(&game, InputEvent::Pop(id));
        }
    });
    let _ = field.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// Delegated animation end on the playfield; bubbles carry no listeners of their own
///
/// Rise and pop animations both end here; the `popped` class tells them apart.
fn setup_animation_end(game: &Shared) {
    let Some(field) = game.borrow().document.get_element_by_id("game") else {
        return;
    };
    let game = game.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::Event| {
        let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
            return;
        };
        if !target.class_list().contains("bubble") {
            return;
        }
        let Some(id) = parse_bubble_id(&target) else {
            return;
        };
        let popped = target.class_list().contains("popped");
        dispatch(&game, InputEvent::animation_end(id, popped));
    });
    let _ = field.add_event_listener_with_callback("animationend", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_visibility(game: &Shared) {
    let document = game.borrow().document.clone();
    let game = game.clone();
    let doc = document.clone();
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        let hidden = doc.visibility_state() == web_sys::VisibilityState::Hidden;
        dispatch(&game, InputEvent::Visibility { hidden });
    });
    let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn show_best_hint(document: &Document, best: u32) {
    let text = format!("Current best on this device: {}", best);
    if let Some(hint) = document.get_element_by_id("best-hint") {
        hint.set_text_content(Some(&text));
        return;
    }
    let Some(card) = document.query_selector("#startOverlay .card").ok().flatten() else {
        return;
    };
    if let Ok(hint) = document.create_element("div") {
        hint.set_id("best-hint");
        hint.set_class_name("foot");
        hint.set_text_content(Some(&text));
        let _ = card.append_child(&hint);
    }
}

fn dom_id(id: BubbleId) -> String {
    format!("bubble-{}-{}", id.generation, id.index)
}

fn parse_bubble_id(el: &Element) -> Option<BubbleId> {
    let generation = el.get_attribute("data-gen")?.parse().ok()?;
    let index = el.get_attribute("data-idx")?.parse().ok()?;
    Some(BubbleId { generation, index })
}

fn set_text(document: &Document, id: &str, text: &str) {
    if let Some(el) = document.get_element_by_id(id) {
        el.set_text_content(Some(text));
    }
}

fn set_style(document: &Document, id: &str, property: &str, value: &str) {
    if let Some(el) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        let _ = el.style().set_property(property, value);
    }
}

fn set_visible(document: &Document, id: &str, visible: bool) {
    if let Some(el) = document
        .get_element_by_id(id)
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
    {
        el.set_hidden(!visible);
        let _ = el.set_attribute("aria-hidden", if visible { "false" } else { "true" });
    }
}
