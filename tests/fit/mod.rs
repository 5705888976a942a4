//! Fit engine tests against synthetic relaxation data.

mod single_run;
mod validation;
