//! 参考数据目录
//!
//! 学生档案、诊疗项目以及种子预约。数据在启动时生成，核心逻辑不会修改它们。

use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{AppointmentType, Booking, ExperienceLevel, Specialty, StudentProfile};

/// 静态参考目录
#[derive(Debug, Clone)]
pub struct Catalog {
    students: Vec<StudentProfile>,
    appointment_types: Vec<AppointmentType>,
}

impl Catalog {
    /// 使用给定数据创建目录
    pub fn new(students: Vec<StudentProfile>, appointment_types: Vec<AppointmentType>) -> Self {
        Self {
            students,
            appointment_types,
        }
    }

    /// 内置种子数据
    pub fn seeded() -> Self {
        Self::new(seed_students(), seed_appointment_types())
    }

    pub fn specialties(&self) -> &'static [Specialty] {
        &Specialty::ALL
    }

    pub fn students(&self) -> &[StudentProfile] {
        &self.students
    }

    pub fn student(&self, id: &str) -> Option<&StudentProfile> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn students_by_specialty(&self, specialty: Specialty) -> Vec<&StudentProfile> {
        self.students
            .iter()
            .filter(|s| s.specialty == specialty)
            .collect()
    }

    pub fn appointment_types(&self) -> &[AppointmentType] {
        &self.appointment_types
    }

    pub fn appointment_type(&self, id: &str) -> Option<&AppointmentType> {
        let found = self.appointment_types.iter().find(|t| t.id == id);
        if found.is_none() {
            tracing::debug!("Appointment type {} not found in catalog", id);
        }
        found
    }

    /// 某专科下的诊疗项目
    pub fn appointment_types_for_specialty(&self, specialty: Specialty) -> Vec<&AppointmentType> {
        self.appointment_types
            .iter()
            .filter(|t| t.specialty == specialty)
            .collect()
    }

    /// 学生可提供的诊疗项目（按其专科过滤）
    pub fn appointment_types_for_student(&self, student_id: &str) -> Vec<&AppointmentType> {
        match self.student(student_id) {
            Some(student) => self.appointment_types_for_specialty(student.specialty),
            None => {
                tracing::debug!("Unknown student {} requested appointment types", student_id);
                Vec::new()
            }
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::seeded()
    }
}

#[allow(clippy::too_many_arguments)]
fn student(
    id: &str,
    name: &str,
    specialty: Specialty,
    semester: u8,
    experience: ExperienceLevel,
    rating: f32,
    completed_cases: u32,
    bio: &str,
    languages: &[&str],
    certifications: &[&str],
) -> StudentProfile {
    StudentProfile {
        id: id.to_string(),
        name: name.to_string(),
        specialty,
        semester,
        experience,
        rating,
        completed_cases,
        bio: bio.to_string(),
        languages: languages.iter().map(|l| l.to_string()).collect(),
        certifications: certifications.iter().map(|c| c.to_string()).collect(),
    }
}

fn seed_students() -> Vec<StudentProfile> {
    vec![
        student(
            "s1",
            "Ana García",
            Specialty::Endodontics,
            8,
            ExperienceLevel::Advanced,
            4.8,
            45,
            "Tratamientos de conducto en piezas anteriores y posteriores.",
            &["Español", "Inglés"],
            &["Endodoncia rotatoria", "RCP básico"],
        ),
        student(
            "s2",
            "Carlos Mendoza",
            Specialty::Orthodontics,
            7,
            ExperienceLevel::Intermediate,
            4.6,
            32,
            "Seguimiento de ortodoncia fija y removible.",
            &["Español"],
            &["Ortodoncia interceptiva"],
        ),
        student(
            "s3",
            "María López",
            Specialty::Periodontics,
            6,
            ExperienceLevel::Intermediate,
            4.7,
            28,
            "Raspado y alisado radicular, mantenimiento periodontal.",
            &["Español", "Portugués"],
            &["Periodoncia no quirúrgica"],
        ),
        student(
            "s4",
            "Diego Ramírez",
            Specialty::OralSurgery,
            9,
            ExperienceLevel::Advanced,
            4.9,
            51,
            "Exodoncias simples y de terceros molares.",
            &["Español", "Inglés"],
            &["Cirugía menor", "Manejo de anestesia local"],
        ),
        student(
            "s5",
            "Lucía Torres",
            Specialty::PediatricDentistry,
            5,
            ExperienceLevel::Beginner,
            4.4,
            12,
            "Atención preventiva infantil y selladores.",
            &["Español"],
            &[],
        ),
    ]
}

fn appointment(
    id: &str,
    name: &str,
    duration_minutes: u32,
    specialty: Specialty,
    description: &str,
    requirements: &[&str],
    estimated_cost: f64,
) -> AppointmentType {
    AppointmentType {
        id: id.to_string(),
        name: name.to_string(),
        duration_minutes,
        specialty,
        description: description.to_string(),
        requirements: requirements.iter().map(|r| r.to_string()).collect(),
        estimated_cost,
    }
}

fn seed_appointment_types() -> Vec<AppointmentType> {
    vec![
        appointment(
            "endo-consult",
            "Consulta de endodoncia",
            30,
            Specialty::Endodontics,
            "Evaluación pulpar y plan de tratamiento.",
            &["Radiografía periapical reciente"],
            150.0,
        ),
        appointment(
            "endo-root-canal",
            "Tratamiento de conducto",
            90,
            Specialty::Endodontics,
            "Endodoncia uni o multirradicular.",
            &["Radiografía periapical", "Historia clínica completa"],
            850.0,
        ),
        appointment(
            "orto-control",
            "Control de ortodoncia",
            30,
            Specialty::Orthodontics,
            "Ajuste y control de aparatología.",
            &["Aparatología instalada"],
            120.0,
        ),
        appointment(
            "orto-install",
            "Instalación de brackets",
            120,
            Specialty::Orthodontics,
            "Cementado de aparatología fija.",
            &["Modelos de estudio", "Radiografía panorámica"],
            1500.0,
        ),
        appointment(
            "perio-scaling",
            "Raspado y alisado radicular",
            60,
            Specialty::Periodontics,
            "Tratamiento periodontal no quirúrgico por cuadrante.",
            &["Periodontograma"],
            300.0,
        ),
        appointment(
            "surgery-extraction",
            "Exodoncia simple",
            60,
            Specialty::OralSurgery,
            "Extracción de pieza erupcionada.",
            &["Radiografía periapical", "Consentimiento informado"],
            250.0,
        ),
        appointment(
            "pedo-sealants",
            "Selladores de fosas y fisuras",
            45,
            Specialty::PediatricDentistry,
            "Aplicación preventiva en molares permanentes.",
            &["Autorización del tutor"],
            90.0,
        ),
        appointment(
            "resto-filling",
            "Restauración con resina",
            60,
            Specialty::RestorativeDentistry,
            "Obturación directa con resina compuesta.",
            &[],
            200.0,
        ),
    ]
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(|d| d.and_hms_opt(hour, minute, 0))
}

/// 已存在的预约，作为预约存储的初始数据
pub fn seed_bookings() -> Vec<Booking> {
    [
        ("s1", at(2026, 10, 22, 16, 0), 60),
        ("s1", at(2026, 10, 23, 17, 0), 30),
        ("s2", at(2026, 10, 20, 16, 30), 60),
        ("s3", at(2026, 10, 24, 9, 0), 90),
    ]
    .into_iter()
    .filter_map(|(student_id, start, duration)| {
        start.map(|start| Booking::new(student_id, start, duration))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_by_specialty() {
        let catalog = Catalog::seeded();
        let endo = catalog.appointment_types_for_specialty(Specialty::Endodontics);
        assert_eq!(endo.len(), 2);
        assert!(endo.iter().all(|t| t.specialty == Specialty::Endodontics));

        assert!(catalog
            .appointment_types_for_specialty(Specialty::Prosthodontics)
            .is_empty());
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.student("s1").map(|s| s.name.as_str()), Some("Ana García"));
        assert!(catalog.student("s99").is_none());
        assert_eq!(
            catalog.appointment_type("perio-scaling").map(|t| t.duration_minutes),
            Some(60)
        );
        assert!(catalog.appointment_type("implant-placement").is_none());
    }

    #[test]
    fn test_appointment_types_for_student() {
        let catalog = Catalog::seeded();
        let types = catalog.appointment_types_for_student("s2");
        assert!(!types.is_empty());
        assert!(types.iter().all(|t| t.specialty == Specialty::Orthodontics));
        assert!(catalog.appointment_types_for_student("nobody").is_empty());
    }

    #[test]
    fn test_seed_bookings() {
        let bookings = seed_bookings();
        assert_eq!(bookings.len(), 4);
        assert_eq!(bookings.iter().filter(|b| b.student_id == "s1").count(), 2);
    }
}
