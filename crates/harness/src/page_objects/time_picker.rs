//! Super date picker in the query bar

use std::sync::Arc;

use tracing::debug;

use crate::error::HarnessResult;
use crate::page_objects::header::HeaderPage;
use crate::services::test_subjects::TestSubjects;

/// Range covering the sample logstash data set
pub const DEFAULT_START_TIME: &str = "Sep 19, 2015 @ 06:31:44.000";
pub const DEFAULT_END_TIME: &str = "Sep 23, 2015 @ 18:31:44.000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
}

pub struct TimePickerPage {
    test_subjects: Arc<TestSubjects>,
    header: Arc<HeaderPage>,
}

impl TimePickerPage {
    pub fn new(test_subjects: Arc<TestSubjects>, header: Arc<HeaderPage>) -> Self {
        Self {
            test_subjects,
            header,
        }
    }

    pub async fn set_historical_data_range(&self) -> HarnessResult<()> {
        self.set_absolute_range(DEFAULT_START_TIME, DEFAULT_END_TIME).await
    }

    pub async fn set_absolute_range(&self, from: &str, to: &str) -> HarnessResult<()> {
        debug!("TimePicker.setAbsoluteRange({}, {})", from, to);
        self.show_start_end_times().await?;

        self.test_subjects.click("superDatePickerendDatePopoverButton").await?;
        self.input_absolute_date(to).await?;

        self.test_subjects.click("superDatePickerstartDatePopoverButton").await?;
        self.input_absolute_date(from).await?;

        self.test_subjects.click("querySubmitButton").await?;
        self.header.wait_until_loading_has_finished().await
    }

    pub async fn get_time_config(&self) -> HarnessResult<TimeRange> {
        self.show_start_end_times().await?;
        Ok(TimeRange {
            start: self
                .test_subjects
                .get_visible_text("superDatePickerstartDatePopoverButton")
                .await?,
            end: self
                .test_subjects
                .get_visible_text("superDatePickerendDatePopoverButton")
                .await?,
        })
    }

    async fn show_start_end_times(&self) -> HarnessResult<()> {
        // A quick-select range hides the start and end buttons.
        if self.test_subjects.exists("superDatePickerShowDatesButton").await? {
            self.test_subjects.click("superDatePickerShowDatesButton").await?;
        }
        Ok(())
    }

    async fn input_absolute_date(&self, value: &str) -> HarnessResult<()> {
        self.test_subjects.click("superDatePickerAbsoluteTab").await?;
        self.test_subjects
            .set_value("superDatePickerAbsoluteDateInput", value)
            .await
    }
}
