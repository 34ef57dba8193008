//! Clause controllers
//!
//! Each module implements one step of the procedure on top of
//! [`StepContext`](crate::step::StepContext).

mod part02_step09;
mod part03_step07;
mod part07_step04;
mod part08_step12;
mod part12_step09;

pub use part02_step09::Part02Step09;
pub use part03_step07::Part03Step07;
pub use part07_step04::Part07Step04;
pub use part08_step12::Part08Step12;
pub use part12_step09::Part12Step09;

use crate::step::StepController;

/// Every available step, in no particular order
pub fn all_steps() -> Vec<Box<dyn StepController>> {
    vec![
        Box::new(Part02Step09),
        Box::new(Part03Step07),
        Box::new(Part07Step04),
        Box::new(Part08Step12),
        Box::new(Part12Step09),
    ]
}
