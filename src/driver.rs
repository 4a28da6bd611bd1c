// the drag optimization driver
//
// a bounded, interruptible step loop: export the point pairs, invert the
// mask, call the generator's step primitive until the user stops it, the
// step limit is hit, or the generator reports convergence, and publish a
// progress snapshot every draw interval. `run_drag` is the loop itself;
// `spawn_drag` wraps it in the background thread the UI talks to, streaming
// snapshots over an mpsc channel the same way the engine thread streams
// frames in a long evolution run.

use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Instant;

use eframe::egui;

use crate::app_types::{ControlStates, DragEvent, Snapshot};
use crate::mode::EditingMode;
use crate::renderer::Renderer;
use crate::session::SessionState;

fn snapshot_of(session: &SessionState, step_idx: usize, controls: ControlStates) -> Snapshot {
    Snapshot {
        session: session.clone(),
        step_idx,
        image_show: session.image_show.clone(),
        controls,
    }
}

/// run one drag optimization to completion, emitting snapshots through
/// `emit`. takes ownership of the session and returns it in its terminal
/// state (mode restored to AddPoints, stop flag spent).
///
/// termination is checked in a fixed order: the user stop flag and the step
/// limit at the top of each iteration, the generator's own should-stop
/// signal right after the step runs. the flag check comes before the
/// (expensive) step so a stop request never costs more than one in-flight
/// step. exactly one termination reason is logged per run.
pub fn run_drag(
    mut session: SessionState,
    renderer: &mut dyn Renderer,
    step_limit: usize,
    emit: &mut dyn FnMut(Snapshot),
) -> SessionState {
    profiling::scope!("run_drag");
    session.stop.store(false, Ordering::SeqCst);

    if !session.points.has_complete_pair() {
        // nothing to drag: redraw the current image, re-enable everything
        log::info!("no complete point pair, skip drag");
        session.mode = EditingMode::AddPoints;
        session.redraw();
        emit(snapshot_of(&session, 0, ControlStates::idle()));
        return session;
    }

    session.mode = EditingMode::Running;
    let (mut sources, mut targets, indices) = session.points.export_for_optimization();
    let drag_mask = session.mask.invert_for_drag();
    // interval 0 would publish nothing and break the modulo; treat it as 1
    let draw_interval = session.draw_interval.max(1);
    log::info!(
        "running drag: {} pairs, sources {sources:?}, targets {targets:?}",
        indices.len()
    );

    let mut step_idx = 0usize;
    loop {
        profiling::scope!("drag_step");
        if session.stop.load(Ordering::SeqCst) {
            log::info!("stop drag by user request");
            break;
        }
        if step_idx > step_limit {
            log::info!("reached max step ({step_limit}), stop");
            break;
        }

        let started = Instant::now();
        let should_stop = match renderer.step(
            &mut session.generator,
            &mut sources,
            &mut targets,
            &drag_mask,
            session.params.motion_lambda,
            session.params.r1_in_pixels,
            session.params.r2_in_pixels,
            session.params.trunc_psi,
        ) {
            Ok(flag) => flag,
            Err(e) => {
                log::error!("drag step {step_idx} failed: {e}");
                break;
            }
        };
        log::debug!("drag step {step_idx} took {:?}", started.elapsed());

        if should_stop {
            log::info!("optimization finished, stop drag");
            break;
        }

        if step_idx % draw_interval == 0 {
            // markers follow the optimization: write the stepped positions
            // back as the pairs' transient source / target
            session.points.commit_step(&indices, &sources, &targets);
            session.image_raw = session.generator.image.clone();
            session.redraw();
            emit(snapshot_of(&session, step_idx, ControlStates::running()));
        }

        step_idx += 1;
    }

    // terminal snapshot: step index reset to 0 signals idle, editing mode
    // restored no matter which condition ended the loop
    session.image_raw = session.generator.image.clone();
    session.redraw();
    session.mode = EditingMode::AddPoints;
    emit(snapshot_of(&session, 0, ControlStates::idle()));
    session
}

/// run the drag loop on a named background thread, streaming events to the
/// UI. the renderer moves into the thread and is handed back in the terminal
/// `Finished` event, so exactly one owner drives the model at a time.
pub fn spawn_drag(
    session: SessionState,
    mut renderer: Box<dyn Renderer + Send>,
    step_limit: usize,
    ctx: egui::Context,
) -> (Receiver<DragEvent>, thread::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("drag".to_owned())
        .spawn(move || {
            let tx_loop = tx.clone();
            let ctx_loop = ctx.clone();
            run_drag(session, renderer.as_mut(), step_limit, &mut |snap| {
                let _ = tx_loop.send(DragEvent::Snapshot(snap));
                ctx_loop.request_repaint();
            });
            let _ = tx.send(DragEvent::Finished { renderer });
            ctx.request_repaint();
        })
        .expect("spawn drag thread");
    (rx, handle)
}
