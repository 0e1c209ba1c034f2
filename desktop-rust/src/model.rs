use ic_inspect_common::{Error, ScanResult, StreamStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Inspect,
    History,
    Report,
}

/// Which texture a decoded image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Selected,
    Registered,
}

pub struct DecodedImage {
    pub size: [usize; 2],
    pub pixels: Vec<u8>,
}

pub enum UiMessage {
    Decoded { slot: ImageSlot, generation: u64, image: DecodedImage },
    DecodeFailed { slot: ImageSlot, generation: u64, message: String },
    ReportDone { outcome: Result<(), Error> },
    IssueDone { outcome: Result<(), Error> },
    Stream(StreamStatus),
    RemoteHistory(Result<Vec<ScanResult>, Error>),
}
