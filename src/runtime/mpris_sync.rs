use tracing::trace;

use crate::app::App;
use crate::mpris::MprisHandle;

/// Push the latest snapshot to the bus. Cheap when nothing visible changed.
pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    if mpris.update(&app.now) {
        trace!(phase = ?app.now.phase, "mpris state changed");
    }
}
