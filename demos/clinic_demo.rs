//! 诊所门户演示程序
//!
//! 展示学生排班查询、预约校验和牙位图编辑保存的完整流程

use chrono::{Local, Weekday};
use dental_clinic::admin::{init_logging, ClinicConfig};
use dental_clinic::domain::utils::next_weekday;
use dental_clinic::domain::Catalog;
use dental_clinic::odontogram::{
    DentalCondition, DentitionType, OdontogramEditor, OdontogramStore, Surface,
    ToothConditionUpdate,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClinicConfig::default();
    init_logging(&config.logging)?;

    println!("🦷 牙科教学诊所门户演示");
    println!("================================");

    demo_scheduling(&config)?;
    demo_odontogram(&config).await?;

    println!("\n✅ 演示完成！");
    Ok(())
}

/// 演示排班查询
fn demo_scheduling(config: &ClinicConfig) -> anyhow::Result<()> {
    println!("\n📅 排班查询演示");
    println!("------------------");

    let catalog = Catalog::seeded();
    let resolver = config.scheduling.build_resolver();

    let student = catalog
        .student("s1")
        .ok_or_else(|| anyhow::anyhow!("Seed student s1 missing"))?;
    println!("学生: {} ({})", student.name, student.specialty);

    let monday = next_weekday(Local::now().date_naive(), Weekday::Mon);
    println!("日期: {}", monday);

    let schedule = resolver.generate_student_schedule(&student.id, monday);
    let free = schedule.iter().filter(|slot| slot.available).count();
    println!("时段总数: {}，可用: {}", schedule.len(), free);

    for appointment_type in catalog.appointment_types_for_student(&student.id) {
        let slots = resolver.available_slots_for_type(&student.id, monday, appointment_type);
        println!(
            "  {} ({} 分钟): {} 个开始时间",
            appointment_type.name,
            appointment_type.duration_minutes,
            slots.len()
        );
        for slot in &slots {
            println!(
                "    {} - {}",
                slot.start.format("%H:%M"),
                slot.end.format("%H:%M")
            );
        }
    }

    // 上课时间不可预约，附带替代时段
    let requested = monday
        .and_hms_opt(9, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid time"))?;
    let validation = resolver.validate_appointment_slot(&student.id, requested, 60);
    println!("\n校验 {}: 可用 = {}", requested.format("%Y-%m-%d %H:%M"), validation.valid);
    if let Some(message) = &validation.message {
        println!("  {}", message);
    }
    for suggestion in &validation.alternatives {
        let starts: Vec<String> = suggestion
            .slots
            .iter()
            .map(|slot| slot.start.format("%H:%M").to_string())
            .collect();
        println!("  {}: {}", suggestion.date, starts.join(", "));
    }

    Ok(())
}

/// 演示牙位图编辑
async fn demo_odontogram(config: &ClinicConfig) -> anyhow::Result<()> {
    println!("\n🦷 牙位图演示");
    println!("------------------");

    let store: Arc<dyn OdontogramStore> = Arc::new(config.odontogram.build_store());
    let mut editor = OdontogramEditor::open(
        "p-001",
        "Juan Pérez",
        DentitionType::Adult,
        "s1",
        store.clone(),
    )
    .await?;
    println!("牙位数: {}，状态: {:?}", editor.layout().tooth_count(), editor.state());

    editor.select_tooth(11)?;
    editor.commit_edit(
        ToothConditionUpdate::condition(DentalCondition::Caries)
            .with_surfaces([Surface::Occlusal, Surface::Mesial])
            .with_notes("Lesión incipiente"),
    )?;
    editor.update_tooth_condition(36, ToothConditionUpdate::condition(DentalCondition::Extracted))?;
    editor.set_general_notes("Control en 6 meses")?;
    println!("编辑后状态: {:?}，有未保存修改: {}", editor.state(), editor.has_changes());

    let version = editor.save().await?;
    println!("保存成功，版本 {}，状态: {:?}", version, editor.state());

    for (condition, count) in editor.condition_counts() {
        println!("  {}: {}", condition, count);
    }
    for notification in editor.take_notifications() {
        println!("  📢 [{:?}] {}", notification.level, notification.message);
    }

    let reopened = OdontogramEditor::open(
        "p-001",
        "Juan Pérez",
        DentitionType::Adult,
        "s2",
        store,
    )
    .await?;
    let tooth = reopened.tooth_condition(11);
    println!(
        "\n重新打开: 版本 {}，11 号牙 {} {:?}",
        reopened.version(),
        tooth.condition,
        tooth.surfaces
    );

    Ok(())
}
