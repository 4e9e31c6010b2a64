//! Scenario tests driving the pipeline and catalogue end to end

mod test_helpers;
