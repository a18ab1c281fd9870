pub mod admin;
pub mod assignment;
pub mod attendance_record;
pub mod class;
pub mod class_schedule;
pub mod notice;
pub mod notice_read;
pub mod student;
pub mod submission;
pub mod teacher;
pub mod user;

pub use admin::Entity as Admin;
pub use assignment::Entity as Assignment;
pub use attendance_record::Entity as AttendanceRecord;
pub use class::Entity as Class;
pub use class_schedule::Entity as ClassSchedule;
pub use notice::Entity as Notice;
pub use notice_read::Entity as NoticeRead;
pub use student::Entity as Student;
pub use submission::Entity as Submission;
pub use teacher::Entity as Teacher;
pub use user::Entity as User;
