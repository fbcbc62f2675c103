use cutout::{
    BgMode, Layer, LayerRegistry, Project, Raster, SmoothStrategy, compose_frame, extract_region,
    jitter_mask,
};

fn gradient_bg(size: u32) -> Raster {
    let mut r = Raster::new(size, size);
    for y in 0..size {
        for x in 0..size {
            let v = ((x * 3 + y * 5) % 200) as u8 + 30;
            r.put_pixel(x, y, [v, v / 2 + 20, 255 - v, 255]);
        }
    }
    r
}

fn block_mask(size: u32, x0: u32, y0: u32, x1: u32, y1: u32) -> Raster {
    let mut m = Raster::new(size, size);
    for y in y0..y1 {
        for x in x0..x1 {
            m.put_mask_value(x, y, 255);
        }
    }
    m
}

fn scene(size: u32) -> (Project, LayerRegistry) {
    let project = Project::new(size, size, 16, 16).unwrap();
    let mut registry = LayerRegistry::new();
    let mut bg = Layer::new_background("bg", "Background", BgMode::Stretch);
    bg.attach_raster(gradient_bg(size), None);
    registry.add(bg).unwrap();
    (project, registry)
}

#[test]
fn extraction_recomposes_to_the_original_selection() {
    let size = 64;
    let (project, mut registry) = scene(size);
    let original = registry.background().unwrap().raster.clone().unwrap();
    let mask = block_mask(size, 20, 20, 40, 40);

    let out = extract_region(&mut registry, &mask, SmoothStrategy::Convolution).unwrap();
    assert_eq!(out.layer_id, "extracted_0");

    // the cut-out layer keeps default placement, so compositing it over the
    // replaced background restores the original pixels inside the selection
    let frame = compose_frame(&project, &registry, 0.0).unwrap();
    for y in 22..38 {
        for x in 22..38 {
            assert_eq!(frame.color.pixel(x, y), original.pixel(x, y));
            assert_eq!(frame.mask.mask_value(x, y), 255);
        }
    }
}

#[test]
fn replaced_background_holds_no_original_selection_interior() {
    let size = 64;
    let (_, mut registry) = scene(size);
    let original = registry.background().unwrap().raster.clone().unwrap();
    let mask = block_mask(size, 16, 16, 48, 48);

    extract_region(&mut registry, &mask, SmoothStrategy::RadialComposite).unwrap();

    let bg = registry.background().unwrap().raster.as_ref().unwrap();
    // far outside the selection the background is byte-identical
    assert_eq!(bg.pixel(2, 2), original.pixel(2, 2));
    assert_eq!(bg.pixel(60, 60), original.pixel(60, 60));
    // deep inside, the hole was filled from the rim rather than kept
    let center = bg.pixel(32, 32);
    assert_eq!(center[3], 255);
}

#[test]
fn repeated_extractions_stack_independent_layers() {
    let size = 64;
    let (_, mut registry) = scene(size);

    let a = extract_region(
        &mut registry,
        &block_mask(size, 8, 8, 20, 20),
        SmoothStrategy::Convolution,
    )
    .unwrap();
    let b = extract_region(
        &mut registry,
        &block_mask(size, 40, 40, 56, 56),
        SmoothStrategy::Convolution,
    )
    .unwrap();

    assert_eq!(a.layer_id, "extracted_0");
    assert_eq!(b.layer_id, "extracted_1");
    assert_eq!(registry.len(), 3);
    assert!(registry.get("extracted_0").unwrap().has_pixels());
    assert!(registry.get("extracted_1").unwrap().has_pixels());
}

#[test]
fn failed_extraction_leaves_registry_untouched() {
    let size = 64;
    let (_, mut registry) = scene(size);
    let before = registry.background().unwrap().raster.clone().unwrap();

    let empty = Raster::new(size, size);
    let err = extract_region(&mut registry, &empty, SmoothStrategy::Convolution);
    assert!(err.is_err());

    assert_eq!(registry.len(), 1);
    let after = registry.background().unwrap().raster.as_ref().unwrap();
    assert_eq!(after.data(), before.data());
}

#[test]
fn jittered_selection_feeds_extraction() {
    let size = 64;
    let (_, mut registry) = scene(size);
    let mask = block_mask(size, 20, 20, 44, 44);

    let shaken = jitter_mask(&mask, 4, 7).unwrap();
    let out = extract_region(&mut registry, &shaken, SmoothStrategy::Convolution).unwrap();
    assert!(registry.get(&out.layer_id).unwrap().has_pixels());
}
