pub mod m202601050001_create_users;
pub mod m202601050002_create_teachers;
pub mod m202601050003_create_classes;
pub mod m202601050004_create_students;
pub mod m202601050005_create_admins;
pub mod m202601050006_create_class_schedules;
pub mod m202601060001_create_assignments;
pub mod m202601060002_create_submissions;
pub mod m202601070001_create_notices;
pub mod m202601070002_create_notice_reads;
pub mod m202601080001_create_attendance_records;
