//! Mapping between the tag values the chip reports for touches and the
//! widgets drawn in the current display list.
//!
//! The chip reports a tag byte for whatever is under the finger. Zero means
//! nothing is touched and 255 means something untagged is touched. Values
//! 1 through 127 are ASCII key codes, as drawn by `CMD_KEYS`. Widgets are
//! tagged with [`TAG_BIAS`](TAG_BIAS) plus their position in this frame's
//! [`TagRegistry`](TagRegistry).

use heapless::Vec;

/// Tag value the chip reports when nothing is touched.
pub const NO_TOUCH: u8 = 0;

/// Tag value for drawing that shouldn't respond to touch, and the value the
/// chip reports when such drawing is touched.
pub const UNTAGGED: u8 = 255;

/// The highest tag value used for keys.
pub const MAX_KEY: u8 = 127;

/// The tag value of the first registered widget in each frame.
pub const TAG_BIAS: u8 = 129;

/// The most widgets that can be tagged in one frame. Tags from
/// `TAG_BIAS` to 254 are available, and 255 is `UNTAGGED`.
pub const MAX_TAGGED_WIDGETS: usize = 32;

/// Identifies a widget within the application's [`WidgetArena`](WidgetArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(pub usize);

/// Implemented by widgets that respond to touch.
///
/// These are called from [`Device::dispatch`](crate::Device::dispatch) on the
/// task that drives the device, so they may take as long as they like, but
/// typically they only record the new state and let the next repaint show it.
pub trait Pressable {
    fn on_press(&mut self) {}

    fn on_release(&mut self) {}

    /// Called with a key's character code once the finger moves off that
    /// key and onto something else.
    fn on_key(&mut self, _key: u8) {}
}

/// Somewhere the application keeps its widgets, so they can be found by
/// [`WidgetId`](WidgetId).
pub trait WidgetArena {
    fn widget_mut(&mut self, id: WidgetId) -> Option<&mut dyn Pressable>;
}

impl<T: Pressable> WidgetArena for [T] {
    fn widget_mut(&mut self, id: WidgetId) -> Option<&mut dyn Pressable> {
        self.get_mut(id.0).map(|w| w as &mut dyn Pressable)
    }
}

/// What a reported tag value refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Nothing that responds to touch: either no touch at all, something
    /// untagged, or a tag that isn't registered in this frame.
    Release,
    Key(u8),
    Widget(WidgetId),
}

/// The widgets tagged in the current frame.
#[derive(Debug, Clone)]
pub struct TagRegistry {
    widgets: Vec<WidgetId, MAX_TAGGED_WIDGETS>,
    key_target: Option<WidgetId>,
}

impl TagRegistry {
    pub const fn new() -> Self {
        Self {
            widgets: Vec::new(),
            key_target: None,
        }
    }

    /// Assigns the next free tag value to the given widget. Returns `None`
    /// if this frame's tags are used up, in which case the widget should be
    /// drawn untagged.
    pub fn register(&mut self, id: WidgetId) -> Option<u8> {
        let index = self.widgets.len();
        match self.widgets.push(id) {
            Ok(()) => Some(TAG_BIAS + index as u8),
            Err(_) => {
                log::warn!(
                    "more than {} tagged widgets in one frame, drawing widget {} untagged",
                    MAX_TAGGED_WIDGETS,
                    id.0
                );
                None
            }
        }
    }

    /// Sets the widget that receives the key codes of the keys drawn in
    /// this frame.
    pub fn set_key_target(&mut self, id: WidgetId) {
        self.key_target = Some(id);
    }

    pub fn key_target(&self) -> Option<WidgetId> {
        self.key_target
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Forgets every tagged widget, at the start of a new frame.
    pub fn clear(&mut self) {
        self.widgets.clear();
        self.key_target = None;
    }

    pub fn resolve(&self, tag: u8) -> Target {
        match tag {
            NO_TOUCH | UNTAGGED => Target::Release,
            1..=MAX_KEY => Target::Key(tag),
            _ if tag < TAG_BIAS => Target::Release,
            _ => match self.widgets.get((tag - TAG_BIAS) as usize) {
                Some(id) => Target::Widget(*id),
                None => Target::Release,
            },
        }
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut reg = TagRegistry::new();
        assert_eq!(reg.register(WidgetId(7)), Some(129));
        assert_eq!(reg.register(WidgetId(3)), Some(130));
        assert_eq!(reg.resolve(129), Target::Widget(WidgetId(7)));
        assert_eq!(reg.resolve(130), Target::Widget(WidgetId(3)));
        assert_eq!(reg.resolve(131), Target::Release);
        assert_eq!(reg.resolve(128), Target::Release);
        assert_eq!(reg.resolve(0), Target::Release);
        assert_eq!(reg.resolve(255), Target::Release);
        assert_eq!(reg.resolve(b'a'), Target::Key(b'a'));
        assert_eq!(reg.resolve(1), Target::Key(1));
        assert_eq!(reg.resolve(127), Target::Key(127));
    }

    #[test]
    fn test_overflow() {
        let mut reg = TagRegistry::new();
        for i in 0..MAX_TAGGED_WIDGETS {
            assert_eq!(reg.register(WidgetId(i)), Some(129 + i as u8));
        }
        assert_eq!(reg.register(WidgetId(99)), None);
        assert_eq!(reg.len(), MAX_TAGGED_WIDGETS);
        assert_eq!(reg.resolve(160), Target::Widget(WidgetId(31)));
        assert_eq!(reg.resolve(161), Target::Release);
    }

    #[test]
    fn test_clear() {
        let mut reg = TagRegistry::new();
        reg.register(WidgetId(0));
        reg.set_key_target(WidgetId(0));
        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.key_target(), None);
        assert_eq!(reg.resolve(129), Target::Release);
    }

    #[test]
    fn test_slice_arena() {
        struct Counter(u32);
        impl Pressable for Counter {
            fn on_press(&mut self) {
                self.0 += 1;
            }
        }

        let mut widgets = [Counter(0), Counter(0)];
        let arena: &mut [Counter] = &mut widgets;
        arena.widget_mut(WidgetId(1)).unwrap().on_press();
        assert!(arena.widget_mut(WidgetId(2)).is_none());
        assert_eq!(widgets[1].0, 1);
    }
}
