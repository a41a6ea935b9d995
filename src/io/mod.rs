/// CSV export of tick reports.
pub mod export;
