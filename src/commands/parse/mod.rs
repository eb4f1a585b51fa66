mod pages;
mod run;

pub use run::run;

use pages::*;
