use std::time::Instant;

use cutout::{
    BgMode, Layer, Project, Prop, Raster, Session, evaluate,
    schema::descriptor::{apply_descriptors, parse_persisted_state},
};

fn checkerboard(size: u32) -> Raster {
    let mut r = Raster::new(size, size);
    for y in 0..size {
        for x in 0..size {
            let v = if (x / 4 + y / 4) % 2 == 0 { 220 } else { 30 };
            r.put_pixel(x, y, [v, v, v, 255]);
        }
    }
    r
}

#[test]
fn json_fixture_reconciles() {
    let s = include_str!("data/persisted_state.json");
    let state = parse_persisted_state(s);

    let project = state.project.to_project().unwrap();
    assert_eq!((project.width, project.height), (1280, 720));
    assert_eq!(project.mask_expansion, 2);

    let mut session = Session::new(project);
    apply_descriptors(&mut session.registry, &state.layers, true);
    assert_eq!(session.registry.len(), 2);

    let hero = session.registry.get("hero").unwrap();
    // "12.5" and "0.8" arrive as strings, true as a bool flag
    assert_eq!(hero.x, 12.5);
    assert_eq!(hero.flip_h, 1.0);
    assert_eq!(hero.foreground_extras().unwrap().opacity, 0.8);

    // the x track overrides the base value between its keys
    let snap = evaluate(hero, 1.0);
    assert_eq!(snap.x, 0.0);
    assert!(snap.flipped_h());
    // single-key opacity track holds flat on both sides
    assert_eq!(evaluate(hero, 9.0).opacity, 1.0);
}

#[test]
fn flush_and_reapply_restores_the_stack() {
    let project = Project::new(128, 128, 16, 32).unwrap();
    let mut session = Session::new(project);

    let mut bg = Layer::new_background("bg", "Background", BgMode::Fill);
    bg.attach_raster(checkerboard(128), None);
    session.registry.add(bg).unwrap();

    let mut fg = Layer::new_foreground("fg", "Sprite");
    fg.attach_raster(checkerboard(16), None);
    fg.set_base_value(Prop::Rotation, 30.0);
    fg.set_keyframe(Prop::Y, 0.0, -10.0);
    fg.set_keyframe(Prop::Y, 1.0, 10.0);
    session.registry.add(fg).unwrap();

    session.mark_dirty();
    let json = session.flush_persisted(Instant::now()).unwrap();
    assert!(!session.is_dirty());

    let state = parse_persisted_state(&json);
    let mut restored = Session::new(state.project.to_project().unwrap());
    apply_descriptors(&mut restored.registry, &state.layers, true);

    assert_eq!(restored.registry.len(), 2);
    let fg2 = restored.registry.get("fg").unwrap();
    assert_eq!(fg2.rotation, 30.0);
    assert!(fg2.has_pixels());
    assert_eq!(
        fg2.raster.as_ref().unwrap().data(),
        checkerboard(16).data()
    );

    for t in [0.0, 0.5, 1.0, 2.0] {
        let a = evaluate(session.registry.get("fg").unwrap(), t);
        let b = evaluate(fg2, t);
        assert_eq!(a.y, b.y);
        assert_eq!(a.rotation, b.rotation);
    }
}

#[test]
fn garbage_blob_falls_back_to_defaults() {
    let state = parse_persisted_state("{not json");
    assert_eq!(state.project.width, 1280);
    assert_eq!(state.project.fps, 16);
    assert!(state.layers.is_empty());
}

#[test]
fn unflushed_edits_survive_a_push() {
    let project = Project::new(128, 128, 16, 32).unwrap();
    let mut session = Session::new(project);
    let mut fg = Layer::new_foreground("fg", "Sprite");
    fg.set_base_value(Prop::X, 50.0);
    session.registry.add(fg).unwrap();

    // host pushes a stale descriptor while a local edit is pending
    session.mark_layer_dirty("fg");
    let stale = parse_persisted_state(
        r#"{"layers":[{"id":"fg","name":"Sprite","kind":"foreground","x":0.0,"keyframes":{}}]}"#,
    );
    apply_descriptors(&mut session.registry, &stale.layers, false);
    assert_eq!(session.registry.get("fg").unwrap().x, 50.0);

    // after a flush the same push lands
    session.flush_persisted(Instant::now()).unwrap();
    apply_descriptors(&mut session.registry, &stale.layers, false);
    assert_eq!(session.registry.get("fg").unwrap().x, 0.0);
}
