mod run;

pub use run::{CHUNKS_FILE_NAME, run};
