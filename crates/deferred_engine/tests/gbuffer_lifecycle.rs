//! Geometry buffer allocation and release

use deferred_engine::render::api::{TextureHandle, TextureKind};
use deferred_engine::render::backends::HeadlessDevice;
use deferred_engine::render::gbuffer::{GBufferTarget, GeometryBuffer};
use std::collections::HashSet;

#[test]
fn create_then_destroy_leaks_nothing() {
    for (width, height, shadow) in [(1, 1, 1), (800, 600, 1024), (1920, 1080, 2048), (333, 77, 512)] {
        let mut device = HeadlessDevice::new(width, height);
        let mut gbuffer = GeometryBuffer::create(&mut device, width, height, shadow).unwrap();
        gbuffer.initialize_point_light_shadows(&mut device, 4, 256).unwrap();
        assert!(gbuffer.is_complete(), "incomplete at {width}x{height}: {:?}", gbuffer.incomplete_framebuffers());

        gbuffer.destroy(&mut device);
        let stats = device.stats();
        assert_eq!(stats.textures.created, stats.textures.deleted);
        assert_eq!(stats.renderbuffers.created, stats.renderbuffers.deleted);
        assert_eq!(stats.framebuffers.created, stats.framebuffers.deleted);
        assert_eq!(stats.live_objects(), 0);
    }
}

#[test]
fn reinitializing_point_shadows_releases_exactly_the_old_set() {
    let mut device = HeadlessDevice::new(64, 64);
    let mut gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();

    for (previous, next) in [(0, 5), (5, 2), (2, 2), (2, 0), (0, 3)] {
        gbuffer.initialize_point_light_shadows(&mut device, previous, 32).unwrap();
        let before = device.stats();
        let old: Vec<_> = gbuffer.point_shadow_maps().to_vec();

        gbuffer.initialize_point_light_shadows(&mut device, next, 32).unwrap();
        let after = device.stats();

        assert_eq!(after.framebuffers.deleted - before.framebuffers.deleted, previous);
        assert_eq!(after.textures.deleted - before.textures.deleted, previous);
        assert_eq!(after.framebuffers.created - before.framebuffers.created, next);
        assert_eq!(after.textures.created - before.textures.created, next);
        for shadow in old {
            assert!(!device.texture_exists(shadow.depth_map));
            assert!(!device.framebuffer_exists(shadow.framebuffer));
        }

        let handles: HashSet<TextureHandle> = (0..next).map(|i| gbuffer.point_light_shadow_map(i)).collect();
        assert_eq!(handles.len(), next);
        assert!(handles.iter().all(|handle| handle.is_valid()));
    }
    gbuffer.destroy(&mut device);
}

#[test]
fn three_point_lights_at_800_by_600() {
    let mut device = HeadlessDevice::new(800, 600);
    let mut gbuffer = GeometryBuffer::create(&mut device, 800, 600, 1024).unwrap();
    gbuffer.initialize_point_light_shadows(&mut device, 3, 512).unwrap();

    let maps: Vec<_> = (0..3).map(|i| gbuffer.point_light_shadow_map(i)).collect();
    assert!(maps.iter().all(|map| map.is_valid()));
    assert_ne!(maps[0], maps[1]);
    assert_ne!(maps[1], maps[2]);
    assert_ne!(maps[0], maps[2]);
    for map in &maps {
        let desc = device.texture_desc(*map).unwrap();
        assert_eq!(desc.kind, TextureKind::CubeMap);
        assert_eq!((desc.width, desc.height), (512, 512));
    }

    assert_eq!(gbuffer.point_light_shadow_map(3), TextureHandle::INVALID);
    assert!(gbuffer.bind_for_point_shadow_pass(&mut device, 3).is_err());
    gbuffer.destroy(&mut device);
}

#[test]
fn texture_accessors_do_not_touch_the_device() {
    let mut device = HeadlessDevice::new(64, 64);
    let gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();
    device.clear_commands();

    for target in GBufferTarget::ALL {
        assert!(gbuffer.texture(target).is_valid());
    }
    let _ = gbuffer.directional_shadow_map();
    assert!(device.commands().is_empty());

    let mut gbuffer = gbuffer;
    gbuffer.destroy(&mut device);
}

#[test]
fn failed_allocation_is_reported_and_cleaned_up() {
    let mut device = HeadlessDevice::new(64, 64);
    device.set_texture_limit(Some(3));
    assert!(GeometryBuffer::create(&mut device, 64, 64, 128).is_err());
    assert_eq!(device.stats().live_objects(), 0);

    device.set_texture_limit(None);
    let mut gbuffer = GeometryBuffer::create(&mut device, 64, 64, 128).unwrap();
    gbuffer.destroy(&mut device);
}
