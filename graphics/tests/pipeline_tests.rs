//! Frame pipeline integration tests for the graphics crate.
//!
//! These tests drive the public API end to end: resources go through the
//! managers and the upload queue, frames are built the way the logical
//! thread builds them, and the renderer is checked through the command
//! stream the device records. Tests are parameterized using `rstest` so
//! real backends can be added as cases.
//!
//! # Test Categories
//!
//! - **Resource Pipeline Tests**: loading, decoding and uploading through
//!   the manager and queue path
//! - **Render Tests**: whole frames against the recording device
//! - **Update Tests**: in-place resource updates reaching later frames
//! - **Handoff Tests**: the logical/render thread frame exchange
//!
//! # Running Tests
//!
//! The `gl` cases skip at runtime: the glow device needs a live context
//! from the window shell, so only the recording device runs here.
//!
//! ```bash
//! # Run all pipeline tests
//! cargo test --test pipeline_tests
//! ```

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rstest::rstest;

use common::{
    Backend, TARGET_HEIGHT, TARGET_WIDTH, TestContext, bound_textures, clear_ops, cube_part,
    draw_count, frame_of, last_uniform_f32, overlay_camera, red_pixel_png, wait_for_loader,
    world_camera,
};
use silkweed_core::math::Mat4;
use silkweed_graphics::{
    CpuTexture, DeviceCall, DrawBatch, EntryState, Extent2d, FrameSlot, MaterialDesc, Rect,
    RenderFrame, RenderPart,
};
use silkweed_vfs::MemorySource;

// ============================================================================
// Resource Pipeline Tests
// ============================================================================

/// An asset texture travels Created -> Loading -> Uploading -> Using when
/// the loader pool and the upload queue both get their turn.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_texture_load_to_usable(#[case] backend: Backend) {
    let source = Arc::new(MemorySource::new());
    source.insert("textures/red.png", red_pixel_png()).unwrap();
    let Some(mut ctx) = TestContext::with_source(backend, source) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let entry = ctx
        .resources
        .textures()
        .get_or_load("./textures//red.png")
        .unwrap();
    wait_for_loader(&entry);
    assert!(!entry.core().has_failed());
    assert_eq!(entry.core().state(), EntryState::Uploading);
    assert!(entry.handle().is_none(), "no handle before the upload pass");

    ctx.pump_uploads();
    assert_eq!(entry.core().state(), EntryState::Using);
    assert!(entry.handle().is_some());

    // Another spelling of the path resolves to the same entry.
    let again = ctx
        .resources
        .textures()
        .get_or_load("textures/./red.png")
        .unwrap();
    assert!(Arc::ptr_eq(&entry, &again));

    // The placeholder set came up with the same passes.
    assert!(ctx.resources.textures().white().handle().is_some());
    assert!(ctx.resources.textures().transparent().handle().is_some());
}

/// A missing asset marks its entry failed and draws bind the white
/// placeholder in its place.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_missing_asset_uses_placeholder_in_draws(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let missing = ctx
        .resources
        .textures()
        .get_or_load("textures/missing.png")
        .unwrap();
    wait_for_loader(&missing);
    assert!(missing.core().has_failed());
    assert!(missing.handle().is_none());

    let material = ctx
        .resources
        .materials()
        .register(
            MaterialDesc::new(
                "materials/broken",
                Arc::clone(ctx.resources.materials().forward_shader()),
            )
            .with_texture(Arc::clone(&missing)),
        )
        .unwrap();
    let cube = ctx.resources.meshes().cube();
    ctx.pump_uploads();

    let mut part = RenderPart::new(world_camera());
    part.opaque
        .push(DrawBatch::single(material, cube, Mat4::identity()));
    let calls = ctx.render(&frame_of(1, vec![part]));

    assert_eq!(draw_count(&calls), 1, "the draw itself must not be dropped");
    let white = ctx.resources.textures().white().handle().unwrap();
    assert_eq!(bound_textures(&calls, 0), vec![white.0]);
}

/// Built-in meshes are created on first request, upload once, and later
/// requests return the same entry without scheduling more work.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_builtin_meshes_upload_once(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let quad = ctx.resources.meshes().quad();
    let cube = ctx.resources.meshes().cube();
    let sphere = ctx.resources.meshes().sphere();
    ctx.pump_uploads();

    let calls = ctx.device.take_calls();
    let creates = calls
        .iter()
        .filter(|call| matches!(call, DeviceCall::CreateMesh(_)))
        .count();
    assert_eq!(creates, 3);

    let vaos = [
        quad.handle().unwrap().vao,
        cube.handle().unwrap().vao,
        sphere.handle().unwrap().vao,
    ];
    assert_ne!(vaos[0], vaos[1]);
    assert_ne!(vaos[1], vaos[2]);

    assert!(Arc::ptr_eq(&quad, &ctx.resources.meshes().quad()));
    assert!(
        ctx.resources.upload_queue().is_empty(),
        "re-requesting a built-in must not schedule another upload"
    );
}

/// Upload work spreads across passes: with actions slower than the
/// budget, each pass runs exactly one and leaves the remainder queued.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_upload_budget_spreads_work(#[case] backend: Backend) {
    const ACTIONS: usize = 5;

    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();

    for _ in 0..ACTIONS {
        ctx.resources
            .upload_queue()
            .push(|_device| std::thread::sleep(Duration::from_millis(2)));
    }
    assert_eq!(ctx.resources.upload_queue().len(), ACTIONS);

    let mut passes = 0;
    while !ctx.resources.upload_queue().is_empty() {
        let used = ctx
            .resources
            .service_uploads(&mut ctx.device, Duration::from_millis(1));
        assert!(used >= Duration::from_millis(1), "spent time is reported");
        passes += 1;
        assert!(passes <= ACTIONS, "a pass must run at least one action");
    }
    assert_eq!(passes, ACTIONS);
}

// ============================================================================
// Render Tests
// ============================================================================

/// A one-camera frame produces the expected command stream: viewport
/// first, one full clear, one program bind, one draw per batch.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_frame_renders_against_device(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();
    let camera = world_camera();
    let part = cube_part(&ctx, camera.clone(), 3);
    ctx.pump_uploads();

    let calls = ctx.render(&frame_of(1, vec![part]));

    assert!(matches!(calls.first(), Some(DeviceCall::SetViewport(_))));
    assert_eq!(clear_ops(&calls), vec![(Some(camera.clear_color), true)]);
    assert_eq!(draw_count(&calls), 3);
    let program_binds = calls
        .iter()
        .filter(|call| matches!(call, DeviceCall::UseProgram(_)))
        .count();
    assert_eq!(program_binds, 1, "one program covers every batch");
    assert_eq!(ctx.renderer.frames_rendered(), 1);
}

/// Stacked cameras layer: the first part clears color and depth, later
/// parts clear depth only, and overlay parts run without depth testing
/// under the short fog convention.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_multi_part_clear_policy(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();
    let world = world_camera();
    let world_part = cube_part(&ctx, world.clone(), 1);
    let overlay_part = cube_part(&ctx, overlay_camera(), 1);
    ctx.pump_uploads();

    let calls = ctx.render(&frame_of(1, vec![world_part, overlay_part]));

    assert_eq!(
        clear_ops(&calls),
        vec![(Some(world.clear_color), true), (None, true)]
    );
    let depth_on = calls
        .iter()
        .position(|call| *call == DeviceCall::SetDepthTest(true))
        .unwrap();
    let depth_off = calls
        .iter()
        .position(|call| *call == DeviceCall::SetDepthTest(false))
        .unwrap();
    assert!(depth_on < depth_off, "world part draws before the overlay");
    assert_eq!(last_uniform_f32(&calls, "u_fog_distance"), Some(10.0));
}

/// Pipeline state survives across frames: a second identical frame skips
/// the viewport and program binds the first frame applied.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_state_cache_holds_across_frames(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();
    let part = cube_part(&ctx, world_camera(), 2);
    ctx.pump_uploads();

    let first = ctx.render(&frame_of(1, vec![part.clone()]));
    let second = ctx.render(&frame_of(2, vec![part]));

    assert!(matches!(first.first(), Some(DeviceCall::SetViewport(_))));
    assert!(
        !second
            .iter()
            .any(|call| matches!(call, DeviceCall::SetViewport(_))),
        "an unchanged viewport must not be reprogrammed"
    );
    assert!(
        !second
            .iter()
            .any(|call| matches!(call, DeviceCall::UseProgram(_))),
        "an unchanged program must not be rebound"
    );
    assert_eq!(draw_count(&second), 2);
    let stats = ctx.renderer.state_stats();
    assert!(stats.skipped > 0);

    // A target resize invalidates the cache, so the viewport comes back.
    ctx.renderer.set_target_size(Extent2d::new(64, 64));
    let resized = ctx.render(&frame_of(3, vec![cube_part(&ctx, world_camera(), 1)]));
    assert!(
        resized
            .iter()
            .any(|call| matches!(call, DeviceCall::SetViewport(Rect { width: 64, .. })))
    );
}

/// A camera with a view rectangle renders into exactly that sub-rect.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_view_rect_drives_the_viewport(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();
    let mut camera = world_camera();
    let half = Rect::new(0, 0, TARGET_WIDTH / 2, TARGET_HEIGHT);
    camera.view_rect = Some(half);
    let part = cube_part(&ctx, camera, 1);
    ctx.pump_uploads();

    let calls = ctx.render(&frame_of(1, vec![part]));
    assert_eq!(calls.first(), Some(&DeviceCall::SetViewport(half)));
}

// ============================================================================
// Update Tests
// ============================================================================

/// Replacing a texture's pixels in place keeps the old GPU copy bound
/// until the next upload pass, then swaps to the new one and deletes the
/// retired handle.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_texture_update_reaches_next_frame(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let badge = ctx
        .resources
        .textures()
        .insert(CpuTexture::solid([255, 0, 0, 255]).with_label("ui/badge"))
        .unwrap();
    let material = ctx
        .resources
        .materials()
        .register(
            MaterialDesc::new(
                "materials/badge",
                Arc::clone(ctx.resources.materials().forward_shader()),
            )
            .with_texture(Arc::clone(&badge)),
        )
        .unwrap();
    let cube = ctx.resources.meshes().cube();
    ctx.pump_uploads();
    let first_id = badge.handle().unwrap().0;

    let mut part = RenderPart::new(world_camera());
    part.opaque
        .push(DrawBatch::single(material, cube, Mat4::identity()));
    let frame = frame_of(1, vec![part]);

    // Same identity, new pixels: the entry is updated in place.
    let same = ctx
        .resources
        .textures()
        .insert(CpuTexture::solid([0, 0, 255, 255]).with_label("ui/badge"))
        .unwrap();
    assert!(Arc::ptr_eq(&badge, &same));
    assert_eq!(badge.core().state(), EntryState::Uploading);

    // The frame drawn before the upload pass still binds the old copy.
    let calls = ctx.render(&frame);
    assert_eq!(draw_count(&calls), 1);
    assert_eq!(bound_textures(&calls, 0), vec![first_id]);

    ctx.device.take_calls();
    ctx.pump_uploads();
    assert_eq!(badge.core().state(), EntryState::Using);
    let second_id = badge.handle().unwrap().0;
    assert_ne!(second_id, first_id);
    assert!(
        ctx.device
            .take_calls()
            .contains(&DeviceCall::DeleteTexture(first_id)),
        "the retired handle must be deleted on the render thread"
    );

    let calls = ctx.render(&frame);
    assert_eq!(bound_textures(&calls, 0), vec![second_id]);
}

/// Resizing an offscreen target goes through maintain: the next upload
/// pass recreates it at the new extent and deletes the old framebuffer.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_render_target_resize_recreates(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };

    let target = ctx
        .resources
        .create_render_target("targets/offscreen", Extent2d::new(128, 128));
    ctx.pump_uploads();
    let first = target.handle().unwrap();
    assert_eq!(first.extent, Extent2d::new(128, 128));

    target.request_resize(Extent2d::new(256, 256));
    assert_eq!(target.core().state(), EntryState::Outdated);

    ctx.resources.maintain();
    ctx.device.take_calls();
    ctx.pump_uploads();

    let second = target.handle().unwrap();
    assert_ne!(second.framebuffer, first.framebuffer);
    assert_eq!(second.extent, Extent2d::new(256, 256));
    assert!(
        ctx.device
            .take_calls()
            .contains(&DeviceCall::DeleteRenderTarget(first.framebuffer))
    );
}

// ============================================================================
// Handoff Tests
// ============================================================================

/// Frames published from a producer thread reach the render loop in
/// order, skipped frames are counted as dropped, and the last frame is
/// always rendered.
#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::gl(Backend::Gl)]
fn test_frame_slot_handoff_between_threads(#[case] backend: Backend) {
    const FRAMES: u64 = 60;

    let Some(mut ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    ctx.pump_uploads();
    let material = Arc::clone(ctx.resources.materials().default_material());
    let mesh = ctx.resources.meshes().cube();
    ctx.pump_uploads();

    let slot = Arc::new(FrameSlot::new());
    let producer = {
        let slot = Arc::clone(&slot);
        let material = Arc::clone(&material);
        let mesh = Arc::clone(&mesh);
        std::thread::spawn(move || {
            for number in 1..=FRAMES {
                let mut part = RenderPart::new(world_camera());
                part.opaque.push(DrawBatch::single(
                    Arc::clone(&material),
                    Arc::clone(&mesh),
                    Mat4::identity(),
                ));
                let mut frame = RenderFrame::new(number, number as f64 / 60.0);
                frame.push_part(part);
                slot.publish(Arc::new(frame));
                std::thread::yield_now();
            }
        })
    };

    let mut rendered = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while rendered.last().copied() != Some(FRAMES) {
        assert!(Instant::now() < deadline, "render loop starved");
        match slot.take() {
            Some(frame) => {
                ctx.renderer
                    .render_frame(&mut ctx.device, &ctx.resources, &frame);
                rendered.push(frame.frame_number);
            }
            // Nothing new yet; the producer will publish again shortly.
            None => std::thread::sleep(Duration::from_micros(200)),
        }
    }
    producer.join().unwrap();

    assert!(rendered.windows(2).all(|pair| pair[0] < pair[1]));
    let stats = slot.stats();
    assert_eq!(stats.published, FRAMES);
    assert_eq!(stats.taken + stats.dropped, FRAMES);
    assert_eq!(ctx.renderer.frames_rendered(), rendered.len() as u64);
}
