#![allow(dead_code)]

use vecs::{Handle, Registry};

pub const ENTITIES_SMALL: usize = 10_000;
pub const ENTITIES_MED: usize = 100_000;
pub const ENTITIES_LARGE: usize = 1_000_000;

#[derive(Clone, Copy)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Clone, Copy)]
pub struct Mass {
    pub value: f32,
}

pub fn populate(registry: &mut Registry, count: usize) -> Vec<Handle> {
    let mut handles = Vec::with_capacity(count);
    for i in 0..count {
        let f = i as f32;
        let handle = registry
            .create((
                Position { x: f, y: -f },
                Velocity { dx: 1.0, dy: 0.5 },
                Mass { value: 1.0 + f },
            ))
            .unwrap();
        handles.push(handle);
    }
    handles
}
