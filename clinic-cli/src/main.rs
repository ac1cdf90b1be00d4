//! 诊所排班与牙位图命令行工具

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use clinic_admin::{init_logging, ConfigManager};
use clinic_core::{Catalog, Specialty};
use clinic_odontogram::{
    DentalCondition, DentitionType, OdontogramEditor, OdontogramStore, Surface,
    ToothConditionUpdate, ToothNumber,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// 按天查找时最多向后查看的天数
const MAX_LOOKAHEAD_DAYS: i64 = 366;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "clinic-cli")]
#[command(about = "牙科教学诊所：学生排班与牙位图工具")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 学生某天的完整时段表
    Schedule {
        #[arg(short, long)]
        student: String,
        #[arg(short, long)]
        date: NaiveDate,
    },
    /// 能容纳给定时长的开始时间
    Slots {
        #[arg(short, long)]
        student: String,
        #[arg(short, long)]
        date: NaiveDate,
        /// 时长（分钟）
        #[arg(long, default_value = "60", conflicts_with = "appointment_type")]
        duration: u32,
        /// 按诊疗项目时长查询
        #[arg(short = 't', long)]
        appointment_type: Option<String>,
    },
    /// 校验预约开始时间，不可用时给出替代时段
    Validate {
        #[arg(short, long)]
        student: String,
        /// 开始时间，例如 "2026-10-19 16:00"
        #[arg(long, value_parser = parse_datetime)]
        start: NaiveDateTime,
        #[arg(long, default_value = "60")]
        duration: u32,
    },
    /// 从某天之后查找替代时段
    Suggest {
        #[arg(short, long)]
        student: String,
        #[arg(short, long)]
        date: NaiveDate,
        #[arg(long, default_value = "60")]
        duration: u32,
        /// 查找天数，默认使用配置值
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKAHEAD_DAYS))]
        days: Option<u32>,
    },
    /// 连续多天的可用时段数量
    Calendar {
        #[arg(short, long)]
        student: String,
        #[arg(short, long)]
        from: NaiveDate,
        #[arg(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=MAX_LOOKAHEAD_DAYS))]
        days: u32,
        #[arg(long, default_value = "60")]
        duration: u32,
    },
    /// 查看学生和诊疗项目目录
    Catalog {
        /// 只显示该专科
        #[arg(long)]
        specialty: Option<Specialty>,
        /// 只显示该学生可做的项目
        #[arg(long, conflicts_with = "specialty")]
        student: Option<String>,
    },
    /// 建立并保存牙位图，例如 `--set 11:caries:OM --set 36:extracted`
    Chart {
        #[arg(short, long)]
        patient: String,
        #[arg(short, long, default_value = "")]
        name: String,
        /// 默认使用配置值
        #[arg(long)]
        dentition: Option<DentitionType>,
        #[arg(long = "set", value_parser = parse_tooth_edit)]
        edits: Vec<(ToothNumber, ToothConditionUpdate)>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value = "cli")]
        author: String,
    },
    /// 打印生效的配置，可选保存为 TOML
    Config {
        #[arg(long)]
        save: Option<String>,
    },
}

/// 解析 `YYYY-MM-DD HH:MM` 或 `YYYY-MM-DDTHH:MM[:SS]`
fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("invalid date-time '{}', expected YYYY-MM-DD HH:MM", value))
}

/// 解析 `牙位:状况[:牙面]`
fn parse_tooth_edit(value: &str) -> Result<(ToothNumber, ToothConditionUpdate), String> {
    let mut parts = value.split(':');
    let tooth: ToothNumber = parts
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .map_err(|_| format!("invalid tooth number in '{}'", value))?;
    let condition: DentalCondition = parts
        .next()
        .ok_or_else(|| format!("missing condition in '{}'", value))?
        .parse()
        .map_err(|e| format!("{}", e))?;

    let mut update = ToothConditionUpdate::condition(condition);
    if let Some(codes) = parts.next() {
        update = update.with_surfaces(Surface::parse_codes(codes).map_err(|e| format!("{}", e))?);
    }
    if parts.next().is_some() {
        return Err(format!("too many fields in '{}'", value));
    }
    Ok((tooth, update))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", output);
    Ok(())
}

fn ensure_student(catalog: &Catalog, student_id: &str) -> Result<()> {
    if catalog.student(student_id).is_none() {
        bail!("Unknown student: {}", student_id);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let manager = ConfigManager::new(args.config.as_deref())?;
    let mut config = manager.get_config().await;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    init_logging(&config.logging)?;

    let catalog = Catalog::seeded();
    let resolver = config.scheduling.build_resolver();

    match args.command {
        Command::Schedule { student, date } => {
            ensure_student(&catalog, &student)?;
            print_json(&resolver.generate_student_schedule(&student, date))?;
        }
        Command::Slots {
            student,
            date,
            duration,
            appointment_type,
        } => {
            ensure_student(&catalog, &student)?;
            let slots = match appointment_type {
                Some(id) => {
                    let appointment_type = catalog
                        .appointment_type(&id)
                        .with_context(|| format!("Unknown appointment type: {}", id))?;
                    resolver.available_slots_for_type(&student, date, appointment_type)
                }
                None => resolver.available_slots(&student, date, duration),
            };
            print_json(&slots)?;
        }
        Command::Validate {
            student,
            start,
            duration,
        } => {
            ensure_student(&catalog, &student)?;
            print_json(&resolver.validate_appointment_slot(&student, start, duration))?;
        }
        Command::Suggest {
            student,
            date,
            duration,
            days,
        } => {
            ensure_student(&catalog, &student)?;
            let days = days.unwrap_or(config.scheduling.suggestion_days);
            print_json(&resolver.suggest_alternative_slots(&student, date, duration, days))?;
        }
        Command::Calendar {
            student,
            from,
            days,
            duration,
        } => {
            ensure_student(&catalog, &student)?;
            print_json(&resolver.daily_availability(&student, from, days, duration))?;
        }
        Command::Catalog { specialty, student } => {
            let output = match (specialty, student) {
                (Some(specialty), _) => serde_json::json!({
                    "specialty": specialty,
                    "students": catalog.students_by_specialty(specialty),
                    "appointment_types": catalog.appointment_types_for_specialty(specialty),
                }),
                (None, Some(student)) => {
                    ensure_student(&catalog, &student)?;
                    serde_json::json!({
                        "student": catalog.student(&student),
                        "appointment_types": catalog.appointment_types_for_student(&student),
                    })
                }
                (None, None) => serde_json::json!({
                    "specialties": catalog.specialties(),
                    "students": catalog.students(),
                    "appointment_types": catalog.appointment_types(),
                }),
            };
            print_json(&output)?;
        }
        Command::Chart {
            patient,
            name,
            dentition,
            edits,
            notes,
            author,
        } => {
            let store: Arc<dyn OdontogramStore> = Arc::new(config.odontogram.build_store());
            let dentition = dentition.unwrap_or(config.odontogram.default_dentition);
            let mut editor =
                OdontogramEditor::open(patient, name, dentition, author, store).await?;

            for (tooth, update) in edits {
                editor.update_tooth_condition(tooth, update)?;
            }
            if let Some(notes) = notes {
                editor.set_general_notes(notes)?;
            }

            let version = editor.save().await?;
            info!("牙位图已保存，版本 {}", version);

            print_json(&serde_json::json!({
                "odontogram": editor.snapshot(),
                "condition_counts": editor.condition_counts(),
                "notifications": editor.take_notifications(),
            }))?;
        }
        Command::Config { save } => {
            if let Some(path) = save {
                manager.save_to(&path).await?;
            }
            print_json(&config)?;
        }
    }

    Ok(())
}
