use futures::future::BoxFuture;

use super::{BuildContext, Submission, require_filled};
use crate::api::{Collection, RecordWriter, WriteAck};
use crate::error::{ApiError, PortalError};
use crate::model::{Identity, Profile};
use crate::state::HrData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub emp_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
}

impl ProfileForm {
    /// Form prefilled with what is currently stored.
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            emp_id: profile.emp_id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            department: profile.department.clone(),
        }
    }

    /// Applies `field=value` edits on top of the form. Unknown fields are an error.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), PortalError> {
        let slot = match field {
            "empId" | "emp_id" | "id" => &mut self.emp_id,
            "name" => &mut self.name,
            "email" => &mut self.email,
            "department" | "dept" => &mut self.department,
            other => {
                return Err(PortalError::Validation(format!(
                    "Unknown profile field \"{other}\"."
                )));
            }
        };
        *slot = value.to_string();
        Ok(())
    }
}

impl Submission for ProfileForm {
    type Record = Profile;

    const ACTION: &'static str = "save your profile";
    const COLLECTION: Collection = Collection::Profile;
    const SUCCESS: &'static str = "Profile saved successfully!";
    const FAILURE: &'static str = "Error saving profile";

    fn build(&self, _identity: &Identity, _ctx: &BuildContext<'_>) -> Result<Profile, PortalError> {
        require_filled(&[
            ("employee id", &self.emp_id),
            ("name", &self.name),
            ("email", &self.email),
            ("department", &self.department),
        ])?;

        Ok(Profile {
            emp_id: self.emp_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            department: self.department.trim().to_string(),
        })
    }

    fn send<'a>(
        writer: &'a dyn RecordWriter,
        identity: &'a Identity,
        record: &'a Profile,
    ) -> BoxFuture<'a, Result<WriteAck, ApiError>> {
        writer.save_profile(identity, record)
    }

    /// Last write wins, so the saved form is the profile.
    fn saved(record: Profile, data: &mut HrData) {
        data.profile = record;
    }
}
