//! Activity instance types and their enabled feature sets.
//!
//! An activity is a full room, a room without a recording list, or a
//! recording list without a room. Site-wide toggles can disable the
//! recording features regardless of instance type.

use crate::config::FeaturesConfig;

/// Kind of conferencing activity instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceType {
    /// Room plus recording list
    RoomWithRecordings,
    /// Room only, no recording list
    RoomOnly,
    /// Recording list only, the meeting lives elsewhere
    RecordingOnly,
}

impl InstanceType {
    /// Feature names of this profile, as handed to the client-side
    /// widget.
    pub fn features(self) -> &'static [&'static str] {
        match self {
            InstanceType::RoomWithRecordings => &["all"],
            InstanceType::RoomOnly => &["showroom"],
            InstanceType::RecordingOnly => &["showrecordings", "importrecordings"],
        }
    }

    fn has_feature(self, name: &str) -> bool {
        self.features().contains(&"all") || self.features().contains(&name)
    }
}

/// Features effectively enabled for one activity instance.
#[derive(Debug, Clone, Copy)]
pub struct EnabledFeatures {
    /// The activity has its own room; live recordings are scoped to it
    pub showroom: bool,
    pub showrecordings: bool,
    pub importrecordings: bool,
}

impl EnabledFeatures {
    /// Combines the instance profile with the site-wide toggles.
    pub fn for_type(kind: InstanceType, config: &FeaturesConfig) -> Self {
        Self {
            showroom: kind.has_feature("showroom"),
            showrecordings: config.recordings_enabled && kind.has_feature("showrecordings"),
            importrecordings: config.import_recordings_enabled
                && kind.has_feature("importrecordings"),
        }
    }
}
