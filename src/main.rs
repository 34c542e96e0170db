//! Chimefall entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use chimefall::Tuning;
    use chimefall::audio::AudioPlayer;
    use chimefall::consts::*;
    use chimefall::engine::{Effect, RewardEngine};
    use chimefall::layout::{LayoutParams, LetterPlacement, place_letters};
    use chimefall::render::{Renderer, Visuals};
    use chimefall::world::World;

    /// Everything the frame loop touches.
    struct App {
        engine: RewardEngine,
        world: World,
        letters: Vec<LetterPlacement>,
        visuals: Visuals,
        renderer: Option<Renderer>,
        audio: AudioPlayer,
        accumulator: f32,
        last_time: f64,
        started: bool,
    }

    impl App {
        fn new(tuning: Tuning, view_w: f32, view_h: f32) -> Self {
            let chars: Vec<char> = tuning.letters.iter().map(|(c, _)| *c).collect();
            let letters = place_letters(&chars, view_w, view_h, &LayoutParams::default());
            let world = World::new(view_w, view_h, &letters, js_sys::Date::now() as u64);
            let visuals = Visuals::new(&letters);
            Self {
                engine: RewardEngine::new(tuning),
                world,
                letters,
                visuals,
                renderer: None,
                audio: AudioPlayer::new(),
                accumulator: 0.0,
                last_time: 0.0,
                started: false,
            }
        }

        /// Rebuild layout and physics for a new viewport. Particles do not
        /// survive a resize; reward state does.
        fn rebuild(&mut self, view_w: f32, view_h: f32) {
            let chars: Vec<char> = self.engine.tuning().letters.iter().map(|(c, _)| *c).collect();
            self.letters = place_letters(&chars, view_w, view_h, &LayoutParams::default());
            self.world = World::new(view_w, view_h, &self.letters, js_sys::Date::now() as u64);
            self.visuals = Visuals::new(&self.letters);
        }

        /// Run fixed-dt physics substeps and feed collision batches to the
        /// reward engine. `now_ms` must come from the same clock the input
        /// handlers stamp spawns with (`Date::now`), or lifetime expiry
        /// deadlines would never be reached.
        fn update(&mut self, dt: f32, now_ms: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            // Re-checked every frame: the context can be suspended again
            // after activation (hidden tab, OS interruption)
            let output_running = self.audio.is_running();

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let pairs = self.world.step(SIM_DT);
                if !pairs.is_empty() {
                    let effects = self.engine.on_collision_batch(now_ms, &pairs, output_running);
                    self.apply(effects);
                }
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            if substeps == MAX_SUBSTEPS {
                // Frame hitch: drop the backlog instead of spiraling
                self.accumulator = 0.0;
            }

            let lifetime = self.engine.tuning().particle_lifetime_ms;
            self.world.expire_particles(now_ms, lifetime);

            let restores = self.engine.advance(now_ms);
            self.apply(restores);
        }

        /// Apply effect commands to the audio and visual collaborators.
        fn apply(&mut self, effects: Vec<Effect>) {
            for effect in effects {
                match effect {
                    Effect::Note {
                        pitch,
                        duration_s,
                        loudness_db,
                    } => self.audio.trigger_note(pitch, duration_s, loudness_db),
                    Effect::Chord {
                        pitches,
                        duration_s,
                        loudness_db,
                    } => self.audio.trigger_chord(&pitches, duration_s, loudness_db),
                    Effect::Flash { letter } => self.visuals.flash(letter),
                    Effect::Unflash { letter } => self.visuals.restore(letter),
                    Effect::GlowOn => set_container_glow(true),
                    Effect::GlowOff => set_container_glow(false),
                }
            }
        }

        fn render(&self) {
            if let Some(renderer) = &self.renderer {
                renderer.draw(&self.letters, &self.visuals, &self.world.particle_views());
            }
        }

        fn spawn_at(&mut self, x: f32, y: f32, now_ms: f64) {
            self.world.spawn_particle(x, y, now_ms);
            if !self.started {
                self.started = true;
                hide_element("instructions");
            }
        }
    }

    /// Toggle the glow class on the simulation container.
    fn set_container_glow(on: bool) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("simulation-container") {
            let _ = el.set_attribute("class", if on { "glow" } else { "" });
        }
    }

    fn hide_element(id: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", "hidden");
        }
    }

    /// Update the user-visible sound status indicator.
    fn set_sound_status(active: bool) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(el) = document.get_element_by_id("sound-status") {
            let text = if active {
                ""
            } else {
                "Sound blocked - tap again to enable"
            };
            el.set_text_content(Some(text));
        }
    }

    /// Kick off an audio activation request and report the outcome back to
    /// the engine once the resume promise settles.
    fn begin_activation(app: Rc<RefCell<App>>) {
        let promise = app.borrow().audio.resume();
        match promise {
            Some(promise) => {
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = JsFuture::from(promise).await.is_ok();
                    let running = app.borrow().audio.is_running();
                    let ok = resolved && running;
                    app.borrow_mut().engine.activation_result(ok);
                    set_sound_status(ok);
                });
            }
            None => {
                app.borrow_mut().engine.activation_result(false);
                set_sound_status(false);
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Chimefall starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let view_w = canvas.client_width() as f32;
        let view_h = canvas.client_height() as f32;
        canvas.set_width(view_w as u32);
        canvas.set_height(view_h as u32);

        let tuning = Tuning::load();
        let master_volume = tuning.master_volume;
        let app = Rc::new(RefCell::new(App::new(tuning, view_w, view_h)));
        {
            let mut a = app.borrow_mut();
            a.audio.set_master_volume(master_volume);
            a.renderer = Renderer::new(canvas.clone());
        }

        setup_input_handlers(&canvas, app.clone());
        setup_resize_handler(&canvas, app.clone());
        setup_clear_button(app.clone());

        request_animation_frame(app);

        log::info!("Chimefall running");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse click spawns a particle and (first time) activates audio
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let now = js_sys::Date::now();
                let want_activation = {
                    let mut a = app.borrow_mut();
                    a.spawn_at(event.offset_x() as f32, event.offset_y() as f32, now);
                    a.engine.request_activation()
                };
                if want_activation {
                    begin_activation(app.clone());
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch spawns at every active touch point
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let now = js_sys::Date::now();
                let rect = canvas_clone.get_bounding_client_rect();
                let want_activation = {
                    let mut a = app.borrow_mut();
                    let touches = event.touches();
                    for i in 0..touches.length() {
                        if let Some(touch) = touches.get(i) {
                            let x = touch.client_x() as f32 - rect.left() as f32;
                            let y = touch.client_y() as f32 - rect.top() as f32;
                            a.spawn_at(x, y, now);
                        }
                    }
                    a.engine.request_activation()
                };
                if want_activation {
                    begin_activation(app.clone());
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard: 'c' clears all particles
        {
            let app = app.clone();
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if matches!(event.key().as_str(), "c" | "C") {
                    app.borrow_mut().world.clear_particles();
                    log::info!("Cleared particles");
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize_handler(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let canvas = canvas.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let w = canvas.client_width() as f32;
            let h = canvas.client_height() as f32;
            canvas.set_width(w as u32);
            canvas.set_height(h as u32);
            app.borrow_mut().rebuild(w, h);
            log::info!("Rebuilt world for {w}x{h}");
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_clear_button(app: Rc<RefCell<App>>) {
        let document = web_sys::window().unwrap().document().unwrap();
        if let Some(btn) = document.get_element_by_id("clear-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().world.clear_particles();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();
            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            // The rAF timestamp only drives dt; engine deadlines share the
            // wall clock the input handlers stamp spawns with
            a.update(dt, js_sys::Date::now());
            a.render();
        }
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use chimefall::consts::SIM_DT;
    use chimefall::engine::Effect;
    use chimefall::layout::{LayoutParams, place_letters};
    use chimefall::world::World;
    use chimefall::{RewardEngine, Tuning};

    env_logger::init();
    log::info!("Chimefall headless demo (run in a browser for sound)");

    let tuning = Tuning::load();
    let chars: Vec<char> = tuning.letters.iter().map(|(c, _)| *c).collect();
    let letters = place_letters(&chars, 800.0, 600.0, &LayoutParams::default());
    let mut world = World::new(800.0, 600.0, &letters, 42);
    let mut engine = RewardEngine::new(tuning);

    // Pretend the user gesture happened and activation succeeded
    engine.request_activation();
    engine.activation_result(true);

    // Rain particles onto the letters and report what would have played
    for p in &letters {
        world.spawn_particle(p.center.x, 30.0, 0.0);
    }

    let mut now_ms = 0.0;
    let mut played = 0u32;
    for _ in 0..(10.0 / SIM_DT) as usize {
        now_ms += SIM_DT as f64 * 1000.0;
        let pairs = world.step(SIM_DT);
        if pairs.is_empty() {
            continue;
        }
        for effect in engine.on_collision_batch(now_ms, &pairs, true) {
            match effect {
                Effect::Note {
                    pitch, loudness_db, ..
                } => {
                    played += 1;
                    log::info!("note {pitch} at {loudness_db:.1} dB");
                }
                Effect::Chord { pitches, .. } => {
                    let names: Vec<String> = pitches.iter().map(|p| p.to_string()).collect();
                    log::info!("chord [{}]", names.join(" "));
                }
                _ => {}
            }
        }
        engine.advance(now_ms);
    }

    println!("Demo finished: {played} notes triggered in 10 simulated seconds");
}
