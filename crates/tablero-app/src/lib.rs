// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod detail;
pub mod ids;
pub mod list;
pub mod metadata;
pub mod model;
pub mod remote;
pub mod settings;
pub mod viewmodel;

pub use detail::*;
pub use ids::*;
pub use list::*;
pub use metadata::*;
pub use model::*;
pub use remote::*;
pub use settings::*;
pub use viewmodel::*;
