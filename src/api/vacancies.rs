//! `/vacancies` bindings.

// crates.io
use serde::de::IgnoredAny;
// self
use crate::{
	_prelude::*,
	api::path_segment,
	error::ValidationError,
	gateway::{ApiRequest, Gateway},
	http::ApiHttpClient,
};

/// Collection endpoint.
pub const VACANCIES_PATH: &str = "/vacancies";

/// Vacancy as returned by the backend.
///
/// `status` (`active`, `archived`, ...) and `job_type` (`remote`, `full_time`, `hybrid`,
/// `office`, ...) are open sets and kept as strings.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyDto {
	/// Vacancy identifier.
	pub id: String,
	/// Owning company.
	pub company_id: String,
	/// Author.
	pub created_by_id: String,
	/// Title.
	pub title: String,
	/// Free-form description.
	#[serde(default)]
	pub description: Option<String>,
	/// Employment kind.
	pub job_type: String,
	/// Location label.
	#[serde(default)]
	pub location: Option<String>,
	/// Lower salary bound.
	#[serde(default)]
	pub salary_from: Option<f64>,
	/// Upper salary bound.
	#[serde(default)]
	pub salary_to: Option<f64>,
	/// Lifecycle status.
	pub status: String,
	/// Creation timestamp as sent by the backend.
	pub created_at: String,
	/// Last update timestamp as sent by the backend.
	pub updated_at: String,
}

/// Filters for [`Gateway::list_vacancies`]; unset fields are not sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VacancyFilter {
	/// Status filter.
	pub status: Option<String>,
	/// Employment kind filter.
	pub job_type: Option<String>,
	/// Company filter.
	pub company_id: Option<String>,
}

/// Body for creating a vacancy.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVacancy {
	/// Title.
	pub title: String,
	/// Free-form description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Employment kind.
	pub job_type: String,
	/// Location label.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	/// Lower salary bound.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub salary_from: Option<f64>,
	/// Upper salary bound.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub salary_to: Option<f64>,
}
impl NewVacancy {
	/// Checks required fields and the salary range.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.title.trim().is_empty() {
			return Err(ValidationError::Required { field: "title" });
		}
		if self.job_type.trim().is_empty() {
			return Err(ValidationError::Required { field: "jobType" });
		}

		validate_salary(self.salary_from, self.salary_to)
	}
}

/// Partial update; only set fields are sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyPatch {
	/// Title.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	/// Free-form description.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Employment kind.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub job_type: Option<String>,
	/// Location label.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub location: Option<String>,
	/// Lower salary bound.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub salary_from: Option<f64>,
	/// Upper salary bound.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub salary_to: Option<f64>,
}
impl VacancyPatch {
	/// Rejects blanked-out required fields and an inverted salary range.
	pub fn validate(&self) -> Result<(), ValidationError> {
		if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
			return Err(ValidationError::Required { field: "title" });
		}
		if self.job_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
			return Err(ValidationError::Required { field: "jobType" });
		}

		validate_salary(self.salary_from, self.salary_to)
	}
}

#[derive(Deserialize)]
struct VacancyList {
	#[serde(default)]
	vacancies: Vec<VacancyDto>,
}

impl<C> Gateway<C>
where
	C: ApiHttpClient,
{
	/// Lists vacancies matching `filter`.
	pub async fn list_vacancies(&self, filter: &VacancyFilter) -> Result<Vec<VacancyDto>> {
		let request = ApiRequest::get(VACANCIES_PATH)
			.with_optional_query("status", filter.status.as_deref())
			.with_optional_query("jobType", filter.job_type.as_deref())
			.with_optional_query("companyId", filter.company_id.as_deref());
		let list: VacancyList = self.send(request).await?;

		Ok(list.vacancies)
	}

	/// Creates a vacancy.
	pub async fn create_vacancy(&self, vacancy: &NewVacancy) -> Result<VacancyDto> {
		vacancy.validate()?;

		self.send(ApiRequest::post(VACANCIES_PATH).with_json(vacancy)?).await
	}

	/// Applies a partial update to vacancy `id`.
	pub async fn update_vacancy(&self, id: &str, patch: &VacancyPatch) -> Result<VacancyDto> {
		let id = path_segment("id", id)?;

		patch.validate()?;

		self.send(ApiRequest::patch(format!("{VACANCIES_PATH}/{id}")).with_json(patch)?).await
	}

	/// Archives vacancy `id`.
	pub async fn archive_vacancy(&self, id: &str) -> Result<()> {
		let id = path_segment("id", id)?;

		self.send::<IgnoredAny>(ApiRequest::delete(format!("{VACANCIES_PATH}/{id}"))).await?;

		Ok(())
	}
}

fn validate_salary(from: Option<f64>, to: Option<f64>) -> Result<(), ValidationError> {
	match (from, to) {
		(Some(from), Some(to)) if from > to => Err(ValidationError::SalaryRange),
		_ => Ok(()),
	}
}
