//! Draw commands and their flat buffers.
//!
//! The draw list is rebuilt every frame and exported to the render target
//! as a pair of parallel buffers: a `u32` stream of ids/kinds and a
//! stride-[`DRAW_STRIDE`] `f32` stream of per-sprite data, ready for
//! typed-array upload. Command order is z-order: later commands paint on
//! top.

/// What a draw command represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A collapsed cluster stack sprite.
    Cluster,
    /// A single item thumbnail.
    Item,
}

impl EntityKind {
    pub fn code(self) -> u32 {
        match self {
            Self::Cluster => 0,
            Self::Item => 1,
        }
    }
}

/// Per-sprite state flags packed into a byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawFlags {
    bits: u8,
}

impl DrawFlags {
    const DIMMED: u8 = 0b0000_0001;
    const LOW_DETAIL: u8 = 0b0000_0010;
    const PLACEHOLDER: u8 = 0b0000_0100;

    pub fn new() -> Self {
        Self { bits: 0 }
    }

    /// Outside the active search-result filter; render target darkens it.
    pub fn is_dimmed(self) -> bool {
        self.bits & Self::DIMMED != 0
    }

    pub fn set_dimmed(&mut self, dimmed: bool) {
        self.toggle(Self::DIMMED, dimmed);
    }

    /// Zoomed out past the LOD threshold; paint a cheap tile instead of
    /// decoding the thumbnail.
    pub fn is_low_detail(self) -> bool {
        self.bits & Self::LOW_DETAIL != 0
    }

    pub fn set_low_detail(&mut self, low: bool) {
        self.toggle(Self::LOW_DETAIL, low);
    }

    /// The thumbnail failed to load; paint the placeholder tile.
    pub fn is_placeholder(self) -> bool {
        self.bits & Self::PLACEHOLDER != 0
    }

    pub fn set_placeholder(&mut self, placeholder: bool) {
        self.toggle(Self::PLACEHOLDER, placeholder);
    }

    pub fn bits(self) -> u8 {
        self.bits
    }

    fn toggle(&mut self, mask: u8, on: bool) {
        if on {
            self.bits |= mask;
        } else {
            self.bits &= !mask;
        }
    }
}

/// One sprite to paint: world position, rotation, opacity and flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub kind: EntityKind,
    /// Raw entity id: the cluster label cast to u32, or the item id.
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Rotation in radians around the sprite center.
    pub rotation: f32,
    /// 0..=1; expanded members fade in with this.
    pub opacity: f32,
    pub flags: DrawFlags,
}

/// f32 lanes per command in [`DrawList::data`]:
/// `[x, y, rotation, opacity, kind, flags]`.
pub const DRAW_STRIDE: usize = 6;

/// The per-frame draw list with its flat export buffers.
#[derive(Debug, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
    ids: Vec<u32>,
    data: Vec<f32>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.ids.clear();
        self.data.clear();
    }

    /// Append a command, encoding it into the flat buffers as well.
    pub fn push(&mut self, command: DrawCommand) {
        self.ids.push(command.id);
        self.data.extend_from_slice(&[
            command.x,
            command.y,
            command.rotation,
            command.opacity,
            command.kind.code() as f32,
            command.flags.bits() as f32,
        ]);
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Entity ids, parallel to the stride-6 data buffer.
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// Flat `[x, y, rotation, opacity, kind, flags]` stream.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Deterministic per-sprite rotation jitter in roughly ±0.12 rad, derived
/// from the id so the scattered-photo look is stable across frames.
pub fn sprite_rotation(id: u32) -> f32 {
    let mut hash = id.wrapping_mul(0x9E37_79B9);
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85EB_CA6B);
    hash ^= hash >> 13;
    // Map to [-1, 1) then scale.
    let unit = (hash as f32 / u32::MAX as f32) * 2.0 - 1.0;
    unit * 0.12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_roundtrip() {
        let mut flags = DrawFlags::new();
        assert!(!flags.is_dimmed());

        flags.set_dimmed(true);
        flags.set_low_detail(true);
        flags.set_placeholder(true);
        assert!(flags.is_dimmed() && flags.is_low_detail() && flags.is_placeholder());

        flags.set_low_detail(false);
        assert!(flags.is_dimmed());
        assert!(!flags.is_low_detail());
        assert!(flags.is_placeholder());
        assert_eq!(flags.bits(), 0b0000_0101);
    }

    #[test]
    fn test_push_encodes_flat_buffers() {
        let mut list = DrawList::new();
        let mut flags = DrawFlags::new();
        flags.set_dimmed(true);
        list.push(DrawCommand {
            kind: EntityKind::Item,
            id: 42,
            x: 10.0,
            y: 20.0,
            rotation: 0.1,
            opacity: 0.5,
            flags,
        });

        assert_eq!(list.len(), 1);
        assert_eq!(list.ids(), &[42]);
        assert_eq!(list.data().len(), DRAW_STRIDE);
        assert_eq!(list.data()[0], 10.0);
        assert_eq!(list.data()[4], 1.0); // item kind
        assert_eq!(list.data()[5], 1.0); // dimmed bit

        list.clear();
        assert!(list.is_empty());
        assert!(list.data().is_empty());
    }

    #[test]
    fn test_sprite_rotation_stable_and_bounded() {
        for id in 0..1000 {
            let a = sprite_rotation(id);
            assert_eq!(a, sprite_rotation(id));
            assert!(a.abs() <= 0.12 + 1e-6);
        }
        // Different ids land on different angles often enough to look
        // scattered.
        assert_ne!(sprite_rotation(1), sprite_rotation(2));
    }
}
