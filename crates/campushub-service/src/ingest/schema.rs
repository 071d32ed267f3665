//! Recognised columns per member kind and the downloadable template.

use campushub_core::error::{AppError, ErrorKind};
use campushub_entity::member::MemberKind;

pub const FULL_NAME: &str = "Full Name";
pub const EMAIL: &str = "Email";
pub const ROLL_NUMBER: &str = "Roll Number";
pub const DEGREE: &str = "Degree";
pub const BRANCH: &str = "Branch";
pub const YEAR: &str = "Year";
pub const DEPARTMENT: &str = "Department";
pub const SPECIALIZATION: &str = "Specialization";

/// One recognised column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Exact header text.
    pub name: &'static str,
    /// Whether every row must carry a non-blank value.
    pub required: bool,
    /// Value shown in the template's example row.
    pub example: &'static str,
}

/// The fixed column set for one member kind.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordSchema {
    /// Member kind the rows describe.
    pub kind: MemberKind,
    /// Columns in template order.
    pub columns: &'static [Column],
}

static STUDENT_COLUMNS: [Column; 6] = [
    Column { name: FULL_NAME, required: true, example: "Asha Rao" },
    Column { name: EMAIL, required: true, example: "asha.rao@college.edu" },
    Column { name: ROLL_NUMBER, required: true, example: "21CS001" },
    Column { name: DEGREE, required: false, example: "B.Tech" },
    Column { name: BRANCH, required: false, example: "Computer Science" },
    Column { name: YEAR, required: false, example: "2" },
];

static TRAINER_COLUMNS: [Column; 4] = [
    Column { name: FULL_NAME, required: true, example: "Vikram Iyer" },
    Column { name: EMAIL, required: true, example: "vikram.iyer@college.edu" },
    Column { name: DEPARTMENT, required: false, example: "Computer Science" },
    Column { name: SPECIALIZATION, required: false, example: "Distributed Systems" },
];

pub static STUDENT_SCHEMA: RecordSchema = RecordSchema {
    kind: MemberKind::Student,
    columns: &STUDENT_COLUMNS,
};

pub static TRAINER_SCHEMA: RecordSchema = RecordSchema {
    kind: MemberKind::Trainer,
    columns: &TRAINER_COLUMNS,
};

impl RecordSchema {
    /// Schema for a member kind.
    pub fn for_kind(kind: MemberKind) -> &'static RecordSchema {
        match kind {
            MemberKind::Student => &STUDENT_SCHEMA,
            MemberKind::Trainer => &TRAINER_SCHEMA,
        }
    }

    /// Look up a recognised column by exact header text.
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the required columns.
    pub fn required(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().filter(|c| c.required).map(|c| c.name)
    }

    /// Header row plus one example row, as CSV.
    pub fn template(&self) -> Result<String, AppError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name))
            .and_then(|_| writer.write_record(self.columns.iter().map(|c| c.example)))
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to render template", e)
            })?;
        let bytes = writer.into_inner().map_err(|e| {
            AppError::internal(format!("Failed to render template: {}", e.error()))
        })?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Template is not UTF-8", e))
    }
}
