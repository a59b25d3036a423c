//! Alerter trait

use biosens_types::AlertKind;
use log::info;

/// Fire-and-forget sound output. There is no queue: callers check
/// [`Alerter::is_playing`] themselves when a sound must not overlap.
pub trait Alerter {
    fn play(&self, kind: AlertKind);

    fn is_playing(&self, kind: AlertKind) -> bool;
}

/// Alerter that only logs; used when no audio device is available
#[derive(Debug, Default)]
pub struct SilentAlerter;

impl Alerter for SilentAlerter {
    fn play(&self, kind: AlertKind) {
        info!("Alert ({:?}) requested, audio output disabled", kind);
    }

    fn is_playing(&self, _kind: AlertKind) -> bool {
        false
    }
}

impl<A: Alerter + ?Sized> Alerter for Box<A> {
    fn play(&self, kind: AlertKind) {
        (**self).play(kind)
    }

    fn is_playing(&self, kind: AlertKind) -> bool {
        (**self).is_playing(kind)
    }
}
