//! Scale-up train: serial passages from the inoculum vial to the production
//! vessel.

mod driver;
mod record;

pub use driver::{dilute, PassageDriver};
pub use record::{ChartSeries, PassageRecord, PassageTrajectory, ScaleUpReport};
