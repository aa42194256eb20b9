//! crates/kidsmart_core/src/seeds.rs
//!
//! Built-in content shipped with the app: template stories merged into the
//! teacher library on first load, and fallback kid-zone bookmarks.

use crate::domain::{ExternalLink, ImageRef, LinkKind, Story, StoryPage};

fn seeded_page(text: &str, seed: &str, image: &str) -> StoryPage {
    StoryPage {
        narrative_text: text.to_string(),
        image_prompt_seed: seed.to_string(),
        image_ref: Some(ImageRef::url(image)),
        speech_audio_ref: None,
    }
}

pub fn default_teacher_stories() -> Vec<Story> {
    vec![
        Story {
            id: "seed_story_squirrels_sharing".to_string(),
            title: "Hai Bạn Sóc Và Quả Hạt Cuối Cùng".to_string(),
            pages: vec![
                seeded_page(
                    "Một buổi sáng nắng đẹp trong rừng, Sóc Nâu và Sóc Cam cùng nhau đi tìm hạt dẻ. Hai bạn chạy nhảy khắp nơi, nhặt được thật nhiều hạt. Khi nhìn lại giỏ, cả hai phát hiện chỉ còn một quả hạt cuối cùng.",
                    "Two cute squirrels brown and orange looking at the last chestnut in the forest cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816519/Whisk_640185ebdc094859322492fdb03a7169dr_stoylu.jpg",
                ),
                seeded_page(
                    "Sóc Nâu và Sóc Cam đều thích quả hạt cuối cùng ấy. Cả hai nhìn nhau, ai cũng muốn nhưng lại sợ bạn buồn. Không khí trở nên im lặng khi cả hai cố suy nghĩ phải làm sao.",
                    "Two squirrels looking at each other hesitating over a nut cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816519/3_xqgeof.jpg",
                ),
                seeded_page(
                    "Sóc Cam bỗng nảy ra một ý: “Hay chúng mình chia đôi nhé! Như vậy cả hai đều được ăn và vẫn vui.” Sóc Nâu lập tức gật đầu đồng ý, cảm thấy lòng nhẹ nhõm.",
                    "One squirrel having an idea to share the nut happy face cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816519/Whisk_f2e5eb2527ccec1905045c893d4365e6dr_pm9wsd.jpg",
                ),
                seeded_page(
                    "Hai bạn cùng cắt đôi quả hạt và thưởng thức. Khi chia sẻ, cả hai cảm thấy vui hơn rất nhiều so với việc giữ riêng. Từ hôm đó, Sóc Nâu và Sóc Cam luôn nhớ: Chia sẻ giúp tình bạn thêm gắn bó.",
                    "Two squirrels eating shared nut happily together friendship cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816519/Whisk_5334313e46be271a5d8453f4a4b3f067dr_p0b05p.jpg",
                ),
            ],
        },
        Story {
            id: "seed_story_bear_hygiene".to_string(),
            title: "Gấu Bé Học Giữ Gìn Vệ Sinh".to_string(),
            pages: vec![
                seeded_page(
                    "Một buổi chiều, Gấu Bé đang chơi ngoài sân vườn. Bạn ấy đào đất, nghịch cát và làm đôi bàn tay lấm lem. Đúng lúc đó, mẹ gọi vào ăn bánh mật ong thơm phức.",
                    "Cute little bear playing with mud in garden dirty hands cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816952/Whisk_fba204fa94692b5ae44463f5565d0853dr_j8qmdh.jpg",
                ),
                seeded_page(
                    "Gấu Bé chạy vào nhà, ngồi ngay vào bàn và đưa tay chuẩn bị cầm bánh. Mẹ Gấu trông thấy đôi bàn tay bám đầy đất và nhẹ nhàng nói:\n“Gấu Bé ơi, con phải rửa tay trước khi ăn nhé!”",
                    "Mother bear telling little bear to wash dirty hands before eating cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816951/Whisk_a0fb6f3c0b97d5c8971444b2eddff631dr_zwaatw.jpg",
                ),
                seeded_page(
                    "Mẹ dẫn Gấu Bé đến bồn rửa tay. Bà chỉ cho bạn cách mở vòi nước, xoa xà phòng, kỳ giữa các ngón tay và rửa thật sạch. Những bọt xà phòng bay lên lung linh khiến Gấu Bé rất thích thú.",
                    "Little bear washing hands with soap bubbles mother bear watching cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816951/Whisk_cb610c28fc2c139bee74e6ae0d44cac3dr_pwhoqu.jpg",
                ),
                seeded_page(
                    "Rửa tay xong, Gấu Bé trở lại bàn ăn. Bạn ấy cầm chiếc bánh mật ong và cắn một miếng thật ngon. Gấu Bé cười tít mắt:\n“Rửa tay sạch xong ăn ngon hơn nhiều!”",
                    "Happy little bear eating honey cake with clean hands cartoon",
                    "https://res.cloudinary.com/dejnvixvn/image/upload/v1764816951/Whisk_0da0b9b1b2831b78ea44dc8c5ee8c0dadr_p0bdgj.jpg",
                ),
            ],
        },
    ]
}

fn default_link(id: &str, title: &str, url: &str, color: &str) -> ExternalLink {
    ExternalLink {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        display_color: color.to_string(),
        originates_from_feed: false,
    }
}

/// Bookmarks shown when nothing is stored locally and no feed is configured.
pub fn default_links(kind: LinkKind) -> Vec<ExternalLink> {
    match kind {
        LinkKind::Story => vec![
            default_link(
                "default_1",
                "Thỏ và Rùa - Truyện Cổ Tích",
                "https://www.youtube.com/watch?v=kYsJ9TqS4Ag",
                "candy-pink",
            ),
            default_link(
                "default_2",
                "Sự Tích Cây Vú Sữa",
                "https://www.youtube.com/watch?v=Xv7_sM8k4gE",
                "candy-aqua",
            ),
        ],
        LinkKind::Game => vec![
            default_link(
                "game_1",
                "Học Đếm Số Cùng Gấu",
                "https://poki.com/en/g/counting-squirrel",
                "candy-mint",
            ),
            default_link(
                "game_2",
                "Tô Màu Công Chúa",
                "https://poki.com/en/g/coloring-book",
                "candy-sky",
            ),
            default_link(
                "game_3",
                "Ghép Hình Động Vật",
                "https://poki.com/en/g/funny-puzzle",
                "candy-lemon",
            ),
        ],
    }
}
