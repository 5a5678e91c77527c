pub mod instructor_dto;
pub mod student_dto;
